//! Store provisioning
//!
//! Reads the store coordinates out of the resolved configuration, builds
//! the document store client, and runs the idempotent create-database then
//! create-container sequence so the application starts against a store
//! that is known to exist.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AppConfig, ConfigError, ConfigResult};
use crate::credentials::ChainCredential;
use crate::logging::Logger;
use crate::store::cosmos::CosmosStore;
use crate::store::handle::DataAccessHandle;
use crate::store::traits::{DocumentStore, StoreError, StoreResult};

/// Config key holding the store account endpoint
pub const COSMOS_ENDPOINT_KEY: &str = "CosmosEndpoint";

/// Config key holding the database name
pub const DATABASE_NAME_KEY: &str = "CosmosDb.DatabaseName";

/// Config key holding the container name
pub const CONTAINER_NAME_KEY: &str = "CosmosDb.ContainerName";

/// Items are partitioned by their id
pub const DEFAULT_PARTITION_KEY_PATH: &str = "/id";

/// Everything needed to connect to and provision the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConnectionDescriptor {
    pub endpoint: String,
    pub database: String,
    pub container: String,
    pub partition_key_path: String,
}

impl StoreConnectionDescriptor {
    pub fn new(
        endpoint: impl Into<String>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            database: database.into(),
            container: container.into(),
            partition_key_path: DEFAULT_PARTITION_KEY_PATH.to_string(),
        }
    }

    /// Override the partition key path
    pub fn with_partition_key_path(mut self, path: impl Into<String>) -> Self {
        self.partition_key_path = path.into();
        self
    }

    /// Read the descriptor out of a resolved configuration snapshot
    ///
    /// All three keys are required; the error names the first one that is
    /// absent or empty.
    pub fn from_config(config: &AppConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.require(COSMOS_ENDPOINT_KEY)?,
            config.require(DATABASE_NAME_KEY)?,
            config.require(CONTAINER_NAME_KEY)?,
        ))
    }
}

/// Errors that can occur while provisioning the store
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Provisioning step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StoreError,
    },
}

impl ProvisionError {
    /// Create a Step error for a named provisioning step
    pub fn step(step: impl Into<String>, source: StoreError) -> Self {
        ProvisionError::Step {
            step: step.into(),
            source,
        }
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Factory that builds a store client for a descriptor
///
/// The default factory builds a [`CosmosStore`] over the ambient
/// credential chain; tests swap in an in-memory store.
pub type StoreFactory =
    Box<dyn Fn(&StoreConnectionDescriptor) -> StoreResult<Arc<dyn DocumentStore>> + Send + Sync>;

/// Provisions the document store an application starts against
///
/// Runs create-database then create-container, both idempotent, and wraps
/// the connected store in a [`DataAccessHandle`] scoped to the configured
/// database and container.
pub struct StoreProvisioner {
    factory: StoreFactory,
    logger: Arc<dyn Logger>,
}

impl StoreProvisioner {
    /// Create a provisioner using the default Cosmos DB factory
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            factory: Box::new(|descriptor| {
                Ok(Arc::new(CosmosStore::new(
                    descriptor.endpoint.clone(),
                    Arc::new(ChainCredential::ambient()),
                )))
            }),
            logger,
        }
    }

    /// Override how store clients are built
    pub fn with_factory(mut self, factory: StoreFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Provision the store described by the descriptor
    pub async fn provision(
        &self,
        descriptor: &StoreConnectionDescriptor,
    ) -> ProvisionResult<DataAccessHandle> {
        let store =
            (self.factory)(descriptor).map_err(|e| ProvisionError::step("connect", e))?;
        self.logger.info(&format!(
            "StoreProvisioner: using {} store at {}",
            store.name(),
            store.endpoint()
        ));

        let outcome = store
            .create_database_if_absent(&descriptor.database)
            .await
            .map_err(|e| {
                ProvisionError::step(format!("create database '{}'", descriptor.database), e)
            })?;
        self.logger.info(&format!(
            "StoreProvisioner: database '{}' {}",
            descriptor.database, outcome
        ));

        let outcome = store
            .create_container_if_absent(
                &descriptor.database,
                &descriptor.container,
                &descriptor.partition_key_path,
            )
            .await
            .map_err(|e| {
                ProvisionError::step(format!("create container '{}'", descriptor.container), e)
            })?;
        self.logger.info(&format!(
            "StoreProvisioner: container '{}' {}",
            descriptor.container, outcome
        ));

        Ok(DataAccessHandle::new(
            store,
            descriptor.database.clone(),
            descriptor.container.clone(),
        ))
    }

    /// Read the descriptor from configuration, then provision
    pub async fn provision_from_config(
        &self,
        config: &AppConfig,
    ) -> ProvisionResult<DataAccessHandle> {
        let descriptor = StoreConnectionDescriptor::from_config(config)?;
        self.provision(&descriptor).await
    }
}

impl std::fmt::Debug for StoreProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreProvisioner").finish()
    }
}
