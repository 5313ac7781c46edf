//! Mock vault for testing
//!
//! Serves a fixed set of secrets without network access and counts fetches,
//! so tests can assert that the resolver does or does not reach for the
//! vault.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::traits::{SecretVault, VaultError, VaultResult, VaultSecret};

/// In-memory vault double
///
/// # Example
///
/// ```
/// use todo_core::vault::MockVault;
///
/// let vault = MockVault::new("kv-test")
///     .with_secret("CosmosEndpoint", "https://acct.documents.azure.com");
/// assert_eq!(vault.fetch_count(), 0);
/// ```
#[derive(Debug)]
pub struct MockVault {
    name: String,
    endpoint: String,
    secrets: Vec<VaultSecret>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MockVault {
    /// Create an empty mock vault
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let endpoint = format!("https://{}.vault.azure.net/", name);
        Self {
            name,
            endpoint,
            secrets: Vec::new(),
            failure: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Add a secret
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.push(VaultSecret::new(name, value));
        self
    }

    /// Make every fetch fail with the given message
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut vault = Self::new(name);
        vault.failure = Some(message.into());
        vault
    }

    /// How many times `fetch_all` has been called
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretVault for MockVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_all(&self) -> VaultResult<Vec<VaultSecret>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(VaultError::status(503, message.clone())),
            None => Ok(self.secrets.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_vault_serves_secrets() {
        let vault = MockVault::new("kv-test")
            .with_secret("KeyA", "value-a")
            .with_secret("Section--Nested", "value-b");

        let secrets = vault.fetch_all().await.unwrap();
        assert_eq!(secrets.len(), 2);
        assert_eq!(secrets[0].name, "KeyA");
        assert_eq!(secrets[1].config_key(), "Section.Nested");
        assert_eq!(vault.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_vault_failure() {
        let vault = MockVault::failing("kv-down", "maintenance window");

        let err = vault.fetch_all().await.unwrap_err();
        assert!(matches!(err, VaultError::Status { status: 503, .. }));
        assert_eq!(vault.fetch_count(), 1);
    }

    #[test]
    fn test_mock_vault_endpoint_follows_convention() {
        let vault = MockVault::new("kv-test");
        assert_eq!(vault.endpoint(), "https://kv-test.vault.azure.net/");
    }
}
