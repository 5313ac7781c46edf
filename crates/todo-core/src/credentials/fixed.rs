//! Fixed token credential for tests

use async_trait::async_trait;

use super::traits::{AccessToken, CredentialResult, TokenCredential};

/// Credential that always returns the same token
///
/// Useful for tests and for local tooling that talks to an emulator with a
/// pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    token: String,
}

impl StaticCredential {
    /// Create a credential around a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticCredential {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_token(&self, _scope: &str) -> CredentialResult<AccessToken> {
        Ok(AccessToken::new(self.token.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_returns_its_token() {
        let credential = StaticCredential::new("fixed-token");
        let token = credential.get_token("any-scope").await.unwrap();
        assert_eq!(token.token, "fixed-token");
        assert!(token.expires_on.is_none());
    }
}
