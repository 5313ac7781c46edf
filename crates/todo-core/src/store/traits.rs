//! Core document store abstractions

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::credentials::CredentialError;

/// Result of an idempotent create operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The resource did not exist and was created
    Created,
    /// The resource was already present and left untouched
    AlreadyExists,
}

impl ProvisionOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, ProvisionOutcome::Created)
    }
}

impl std::fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionOutcome::Created => write!(f, "created"),
            ProvisionOutcome::AlreadyExists => write!(f, "already exists"),
        }
    }
}

/// Errors that can occur when talking to a document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item has no string 'id' field")]
    MissingId,

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Create a Status error from an HTTP response
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        StoreError::Status {
            status,
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document store holding JSON items in partitioned containers
///
/// Databases and containers are created on demand; both create operations
/// are idempotent so startup can run them unconditionally. Items are
/// addressed by id, which doubles as the partition key value.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short name identifying the store implementation
    fn name(&self) -> &str;

    /// Endpoint the store talks to
    fn endpoint(&self) -> &str;

    /// Create a database unless it already exists
    async fn create_database_if_absent(&self, database: &str) -> StoreResult<ProvisionOutcome>;

    /// Create a container unless it already exists
    ///
    /// The database must exist first. `partition_key_path` names the item
    /// field used for partitioning, e.g. `/id`.
    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<ProvisionOutcome>;

    /// Insert or replace an item
    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        item: Value,
    ) -> StoreResult<()>;

    /// Read a single item, `None` when absent
    async fn read_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        id: &str,
    ) -> StoreResult<Option<Value>>;

    /// Delete an item; absent items are an error
    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        id: &str,
    ) -> StoreResult<()>;

    /// List every item in a container
    async fn list_items(&self, database: &str, container: &str) -> StoreResult<Vec<Value>>;
}
