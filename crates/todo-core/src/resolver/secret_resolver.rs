//! Environment-conditional secret resolution
//!
//! Outside production the base configuration passes through untouched: no
//! vault, no file reads. In production the resolver fetches every secret
//! from the configured vault and merges the optional local secrets file,
//! then rebuilds the snapshot with the full layering.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{
    AppConfig, ConfigBuilder, ConfigError, ConfigSource, JsonFileConfigSource,
    MemoryConfigSource, RuntimeEnvironment,
};
use crate::credentials::ChainCredential;
use crate::logging::Logger;
use crate::vault::{SecretVault, VaultClient, VaultError, VaultResult};

/// Config key that names the vault to pull secrets from
///
/// When the key is absent or empty, the vault step is skipped entirely.
pub const KEY_VAULT_NAME_KEY: &str = "KeyVaultName";

/// Where the deployment mounts the optional local secrets file
pub const DEFAULT_SECRETS_FILE: &str = "secrets/appsettings.secrets.json";

/// Factory that opens a vault by name
///
/// The default opener builds a [`VaultClient`] over the ambient credential
/// chain; tests swap in recorded fixtures.
pub type VaultOpener = Box<dyn Fn(&str) -> VaultResult<Arc<dyn SecretVault>> + Send + Sync>;

/// Errors that can occur during secret resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Secret vault '{vault}' unavailable: {source}")]
    VaultUnavailable {
        vault: String,
        #[source]
        source: VaultError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Resolves the final configuration snapshot for a runtime environment
///
/// The resolver owns no configuration itself; it takes the caller's base
/// layering (defaults, environment variables) and conditionally stacks the
/// secret sources on top. Precedence after resolution, lowest first:
/// base sources, local secrets file, vault.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todo_core::config::{ConfigBuilder, RuntimeEnvironment};
/// use todo_core::logging::NoOpLogger;
/// use todo_core::resolver::SecretResolver;
///
/// let resolver = SecretResolver::new(Arc::new(NoOpLogger::new()));
/// let config = resolver
///     .resolve_blocking(ConfigBuilder::new(), RuntimeEnvironment::Development)
///     .unwrap();
/// assert!(config.is_empty());
/// ```
pub struct SecretResolver {
    secrets_file: PathBuf,
    vault_opener: VaultOpener,
    logger: Arc<dyn Logger>,
}

impl SecretResolver {
    /// Create a resolver with the default vault opener and secrets file path
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            secrets_file: PathBuf::from(DEFAULT_SECRETS_FILE),
            vault_opener: Box::new(|name| {
                Ok(Arc::new(VaultClient::from_name(
                    name,
                    Arc::new(ChainCredential::ambient()),
                )))
            }),
            logger,
        }
    }

    /// Override the local secrets file path
    pub fn with_secrets_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_file = path.into();
        self
    }

    /// Override how vaults are opened
    pub fn with_vault_opener(mut self, opener: VaultOpener) -> Self {
        self.vault_opener = opener;
        self
    }

    /// Resolve the configuration for the given environment
    ///
    /// Outside production this returns the base snapshot unchanged,
    /// whether or not a vault name is configured. In production:
    ///
    /// 1. The base layering is snapshotted to read [`KEY_VAULT_NAME_KEY`].
    /// 2. If a vault is named, all of its enabled secrets are fetched;
    ///    any vault failure aborts startup.
    /// 3. The optional local secrets file is merged beneath the vault
    ///    entries; a missing file is ignored, a malformed one is fatal.
    pub async fn resolve(
        &self,
        base: ConfigBuilder,
        environment: RuntimeEnvironment,
    ) -> ResolveResult<AppConfig> {
        if !environment.is_production() {
            self.logger.debug(&format!(
                "SecretResolver: {} environment, secret sources skipped",
                environment
            ));
            return Ok(base.build());
        }

        let snapshot = base.build();
        let vault_source = match snapshot.get(KEY_VAULT_NAME_KEY) {
            Some(name) if !name.is_empty() => self.fetch_vault_source(name).await?,
            _ => {
                self.logger
                    .debug("SecretResolver: no vault name configured, vault skipped");
                None
            }
        };

        let mut builder = base;
        match JsonFileConfigSource::load_optional(&self.secrets_file)? {
            Some(file) => {
                self.logger.info(&format!(
                    "SecretResolver: merged local secrets file {}",
                    self.secrets_file.display()
                ));
                builder = builder.add_source(Arc::new(file));
            }
            None => {
                self.logger.debug(&format!(
                    "SecretResolver: no local secrets file at {}",
                    self.secrets_file.display()
                ));
            }
        }
        if let Some(source) = vault_source {
            builder = builder.add_source(source);
        }

        Ok(builder.build())
    }

    /// Blocking variant of [`resolve`](Self::resolve) for synchronous hosts
    pub fn resolve_blocking(
        &self,
        base: ConfigBuilder,
        environment: RuntimeEnvironment,
    ) -> ResolveResult<AppConfig> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.resolve(base, environment))
    }

    async fn fetch_vault_source(&self, name: &str) -> ResolveResult<Option<Arc<dyn ConfigSource>>> {
        self.logger.info(&format!(
            "SecretResolver: fetching secrets from vault '{}'",
            name
        ));
        let vault = (self.vault_opener)(name).map_err(|e| ResolveError::VaultUnavailable {
            vault: name.to_string(),
            source: e,
        })?;
        let secrets = vault
            .fetch_all()
            .await
            .map_err(|e| ResolveError::VaultUnavailable {
                vault: name.to_string(),
                source: e,
            })?;

        if secrets.is_empty() {
            self.logger.warn(&format!(
                "SecretResolver: vault '{}' returned no secrets",
                name
            ));
            return Ok(None);
        }

        self.logger.info(&format!(
            "SecretResolver: loaded {} secrets from vault '{}'",
            secrets.len(),
            name
        ));
        let values: HashMap<String, String> = secrets
            .iter()
            .map(|secret| (secret.config_key(), secret.value.clone()))
            .collect();
        let source = MemoryConfigSource::with_values(format!("vault:{}", name), values);
        Ok(Some(Arc::new(source)))
    }
}
