//! Startup sequencing
//!
//! Composes secret resolution and store provisioning into the single
//! awaited-to-completion sequence a host runs before serving traffic.
//! Nothing here is background work: when `run` returns, configuration is
//! final and the store exists.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigBuilder, ConfigError, RuntimeEnvironment};
use crate::logging::{ConsoleLogger, Logger};
use crate::resolver::{ResolveError, SecretResolver};
use crate::store::{
    DataAccessHandle, ProvisionError, StoreConnectionDescriptor, StoreProvisioner,
};

/// Errors that can abort startup
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Runs the startup sequence: resolve secrets, then provision the store
///
/// The default wiring talks to the real vault and store; tests swap in
/// the resolver and provisioner seams.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todo_core::bootstrap::Bootstrapper;
/// use todo_core::config::{ConfigBuilder, EnvConfigSource, RuntimeEnvironment};
/// use todo_core::logging::ConsoleLogger;
///
/// let base = ConfigBuilder::new().add_source(Arc::new(EnvConfigSource::new()));
/// let bootstrapper = Bootstrapper::new(Arc::new(ConsoleLogger::default()));
/// let handle = bootstrapper
///     .run_blocking(base, RuntimeEnvironment::from_env())
///     .expect("startup failed");
/// println!("store ready: {}/{}", handle.database(), handle.container());
/// ```
pub struct Bootstrapper {
    resolver: SecretResolver,
    provisioner: StoreProvisioner,
    logger: Arc<dyn Logger>,
}

impl Bootstrapper {
    /// Create a bootstrapper with default resolver and provisioner wiring
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            resolver: SecretResolver::new(logger.clone()),
            provisioner: StoreProvisioner::new(logger.clone()),
            logger,
        }
    }

    /// Replace the secret resolver
    pub fn with_resolver(mut self, resolver: SecretResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the store provisioner
    pub fn with_provisioner(mut self, provisioner: StoreProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Run startup to completion
    ///
    /// 1. Resolve the final configuration for the environment.
    /// 2. Read the store coordinates out of it.
    /// 3. Create the database and container if absent.
    ///
    /// The returned handle is the application's only entry to the store;
    /// clone it wherever data access is needed.
    pub async fn run(
        &self,
        base: ConfigBuilder,
        environment: RuntimeEnvironment,
    ) -> BootstrapResult<DataAccessHandle> {
        self.logger.info(&format!(
            "Bootstrapper: starting in {} environment",
            environment
        ));

        let config = self.resolver.resolve(base, environment).await?;
        let descriptor = StoreConnectionDescriptor::from_config(&config)?;
        let handle = self.provisioner.provision(&descriptor).await?;

        self.logger.info(&format!(
            "Bootstrapper: data store ready (database '{}', container '{}')",
            handle.database(),
            handle.container()
        ));
        Ok(handle)
    }

    /// Blocking variant of [`run`](Self::run) for synchronous hosts
    pub fn run_blocking(
        &self,
        base: ConfigBuilder,
        environment: RuntimeEnvironment,
    ) -> BootstrapResult<DataAccessHandle> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(base, environment))
    }
}

impl std::fmt::Debug for Bootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper").finish()
    }
}

/// Run startup with the default wiring and console logging
pub async fn bootstrap(
    base: ConfigBuilder,
    environment: RuntimeEnvironment,
) -> BootstrapResult<DataAccessHandle> {
    Bootstrapper::new(Arc::new(ConsoleLogger::default()))
        .run(base, environment)
        .await
}

/// Blocking variant of [`bootstrap`] for synchronous hosts
pub fn bootstrap_blocking(
    base: ConfigBuilder,
    environment: RuntimeEnvironment,
) -> BootstrapResult<DataAccessHandle> {
    Bootstrapper::new(Arc::new(ConsoleLogger::default()))
        .run_blocking(base, environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigSource;
    use crate::logging::NoOpLogger;
    use crate::store::{MockDocumentStore, StoreFactory};
    use crate::vault::MockVault;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn base_config(pairs: &[(&str, &str)]) -> ConfigBuilder {
        let source = MemoryConfigSource::new("defaults");
        for (key, value) in pairs {
            source.set(*key, *value);
        }
        ConfigBuilder::new().add_source(Arc::new(source))
    }

    fn nonexistent_secrets_file() -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        dir.path().join("appsettings.secrets.json")
    }

    fn resolver_with_vault(vault: Arc<MockVault>) -> SecretResolver {
        SecretResolver::new(test_logger())
            .with_secrets_file(nonexistent_secrets_file())
            .with_vault_opener(Box::new(move |_name| Ok(vault.clone())))
    }

    fn factory_for(store: Arc<MockDocumentStore>, calls: Arc<AtomicUsize>) -> StoreFactory {
        Box::new(move |_descriptor| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(store.clone())
        })
    }

    #[tokio::test]
    async fn test_development_uses_base_config_only() {
        // The vault would fail if consulted; outside production it never is
        let vault = Arc::new(MockVault::failing("kv", "unreachable"));
        let store = Arc::new(MockDocumentStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let bootstrapper = Bootstrapper::new(test_logger())
            .with_resolver(resolver_with_vault(vault.clone()))
            .with_provisioner(
                StoreProvisioner::new(test_logger())
                    .with_factory(factory_for(store.clone(), calls.clone())),
            );

        let base = base_config(&[
            ("KeyVaultName", "kv"),
            ("CosmosEndpoint", "https://localhost:8081"),
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let handle = bootstrapper
            .run(base, RuntimeEnvironment::Development)
            .await
            .unwrap();

        assert_eq!(handle.database(), "Tasks");
        assert_eq!(vault.fetch_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.operations(),
            vec![
                "create_database Tasks".to_string(),
                "create_container Tasks/Items pk=/id".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_production_takes_store_coordinates_from_vault() {
        let vault = Arc::new(
            MockVault::new("kv")
                .with_secret("CosmosEndpoint", "https://prod.documents.azure.com")
                .with_secret("CosmosDb--DatabaseName", "ProdTasks"),
        );
        let store = Arc::new(MockDocumentStore::new());
        let descriptors: Arc<Mutex<Vec<StoreConnectionDescriptor>>> =
            Arc::new(Mutex::new(Vec::new()));

        let capture = descriptors.clone();
        let capture_store = store.clone();
        let bootstrapper = Bootstrapper::new(test_logger())
            .with_resolver(resolver_with_vault(vault.clone()))
            .with_provisioner(StoreProvisioner::new(test_logger()).with_factory(Box::new(
                move |descriptor| {
                    capture.lock().unwrap().push(descriptor.clone());
                    Ok(capture_store.clone())
                },
            )));

        let base = base_config(&[
            ("KeyVaultName", "kv"),
            ("CosmosEndpoint", "https://localhost:8081"),
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let handle = bootstrapper
            .run(base, RuntimeEnvironment::Production)
            .await
            .unwrap();

        // Vault entries override the base layer
        assert_eq!(handle.database(), "ProdTasks");
        assert_eq!(vault.fetch_count(), 1);
        let seen = descriptors.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].endpoint, "https://prod.documents.azure.com");
        assert_eq!(seen[0].container, "Items");
        assert_eq!(
            store.operations(),
            vec![
                "create_database ProdTasks".to_string(),
                "create_container ProdTasks/Items pk=/id".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_required_key_names_it_and_skips_the_store() {
        let store = Arc::new(MockDocumentStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let bootstrapper = Bootstrapper::new(test_logger())
            .with_resolver(
                SecretResolver::new(test_logger()).with_secrets_file(nonexistent_secrets_file()),
            )
            .with_provisioner(
                StoreProvisioner::new(test_logger()).with_factory(factory_for(store, calls.clone())),
            );

        // No endpoint anywhere, production mode
        let base = base_config(&[
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let err = bootstrapper
            .run(base, RuntimeEnvironment::Production)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("CosmosEndpoint"));
        assert!(matches!(
            err,
            BootstrapError::Config(ConfigError::MissingKey(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_production_vault_outage_aborts_startup() {
        let vault = Arc::new(MockVault::failing("kv", "unreachable"));
        let store = Arc::new(MockDocumentStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let bootstrapper = Bootstrapper::new(test_logger())
            .with_resolver(resolver_with_vault(vault))
            .with_provisioner(
                StoreProvisioner::new(test_logger()).with_factory(factory_for(store, calls.clone())),
            );

        let base = base_config(&[
            ("KeyVaultName", "kv"),
            ("CosmosEndpoint", "https://localhost:8081"),
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let err = bootstrapper
            .run(base, RuntimeEnvironment::Production)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Resolve(ResolveError::VaultUnavailable { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_provision_error() {
        let store = Arc::new(MockDocumentStore::failing("service down"));
        let calls = Arc::new(AtomicUsize::new(0));

        let bootstrapper = Bootstrapper::new(test_logger()).with_provisioner(
            StoreProvisioner::new(test_logger()).with_factory(factory_for(store, calls)),
        );

        let base = base_config(&[
            ("CosmosEndpoint", "https://localhost:8081"),
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let err = bootstrapper
            .run(base, RuntimeEnvironment::Development)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Provision(ProvisionError::Step { .. })
        ));
    }

    #[test]
    fn test_run_blocking_completes_startup() {
        let store = Arc::new(MockDocumentStore::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let bootstrapper = Bootstrapper::new(test_logger()).with_provisioner(
            StoreProvisioner::new(test_logger()).with_factory(factory_for(store.clone(), calls)),
        );

        let base = base_config(&[
            ("CosmosEndpoint", "https://localhost:8081"),
            ("CosmosDb.DatabaseName", "Tasks"),
            ("CosmosDb.ContainerName", "Items"),
        ]);
        let handle = bootstrapper
            .run_blocking(base, RuntimeEnvironment::Development)
            .unwrap();

        assert_eq!(handle.container(), "Items");
        assert!(store.container_exists("Tasks", "Items"));
    }
}
