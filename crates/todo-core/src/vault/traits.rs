//! Core trait and types for secret vaults

use async_trait::async_trait;
use thiserror::Error;

use crate::credentials::CredentialError;

/// Separator in vault secret names that maps to `.` in config keys
///
/// Vault names cannot contain dots, so `CosmosDb--DatabaseName` stands for
/// the config key `CosmosDb.DatabaseName`.
pub const NAME_SEPARATOR: &str = "--";

/// One secret fetched from a vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSecret {
    /// Name as stored in the vault
    pub name: String,
    pub value: String,
}

impl VaultSecret {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The configuration key this secret maps to
    pub fn config_key(&self) -> String {
        self.name.replace(NAME_SEPARATOR, ".")
    }
}

/// Errors that can occur while talking to a vault
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Vault returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from vault: {0}")]
    InvalidResponse(String),
}

impl VaultError {
    /// Create a status error from a non-success response
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

pub type VaultResult<T> = Result<T, VaultError>;

/// Trait for secret vault access
///
/// The resolver fetches every secret once during startup and discards the
/// vault handle afterwards; nothing holds a vault between requests.
///
/// Implementations:
/// - `VaultClient`: the hosted key vault, over REST
/// - `MockVault`: fixed secrets for tests
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Name of the vault
    fn name(&self) -> &str;

    /// Endpoint the vault is served from
    fn endpoint(&self) -> &str;

    /// Fetch all enabled secrets
    async fn fetch_all(&self) -> VaultResult<Vec<VaultSecret>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_maps_separator() {
        let secret = VaultSecret::new("CosmosDb--DatabaseName", "Todo");
        assert_eq!(secret.config_key(), "CosmosDb.DatabaseName");
    }

    #[test]
    fn test_config_key_without_separator_is_unchanged() {
        let secret = VaultSecret::new("CosmosEndpoint", "https://acct.documents.azure.com");
        assert_eq!(secret.config_key(), "CosmosEndpoint");
    }

    #[test]
    fn test_status_error_message() {
        let err = VaultError::status(403, "caller is not authorized");
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("not authorized"));
    }
}
