//! Todo Core
//!
//! Runtime-agnostic startup layer for the todo web app.
//! This crate resolves configuration and secrets, provisions the document
//! store, and hands the host a process-lifetime data access handle.
//!
//! ## Startup Sequence
//!
//! The `bootstrap` module composes the whole sequence:
//! - Merge the ordered configuration sources into an immutable snapshot
//! - Pull vault secrets and the optional local secrets file (production only)
//! - Create the database and container if absent
//!
//! ```rust,ignore
//! use todo_core::bootstrap::Bootstrapper;
//! use todo_core::config::{ConfigBuilder, EnvConfigSource, RuntimeEnvironment};
//!
//! let base = ConfigBuilder::new().add_source(Arc::new(EnvConfigSource::new()));
//! let handle = Bootstrapper::new(logger)
//!     .run(base, RuntimeEnvironment::from_env())
//!     .await?;
//!
//! // Hand the handle to whatever serves requests
//! let items: Vec<TodoItem> = handle.list_items().await?;
//! ```

pub mod config;
pub mod credentials;
pub mod vault;
pub mod resolver;
pub mod store;
pub mod bootstrap;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, ConfigBuilder, ConfigError, ConfigResult, ConfigSource,
    EnvConfigSource, JsonFileConfigSource, MemoryConfigSource,
    RuntimeEnvironment, ENVIRONMENT_VAR,
};

pub use credentials::{
    TokenCredential, AccessToken, CredentialError, CredentialResult,
    ChainCredential, EnvironmentCredential, ManagedIdentityCredential, StaticCredential,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger};

pub use vault::{SecretVault, VaultSecret, VaultError, VaultResult, VaultClient, MockVault};

pub use resolver::{SecretResolver, ResolveError, ResolveResult, KEY_VAULT_NAME_KEY};

pub use store::{
    DocumentStore, DataAccessHandle, ProvisionOutcome, StoreError, StoreResult,
    StoreConnectionDescriptor, StoreProvisioner, CosmosStore, MockDocumentStore,
    ProvisionError,
};

pub use bootstrap::{bootstrap, bootstrap_blocking, BootstrapError, BootstrapResult, Bootstrapper};
