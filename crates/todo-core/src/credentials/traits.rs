//! Core trait and types for token credentials

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use thiserror::Error;

/// A bearer token with optional expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The raw bearer token
    pub token: String,
    /// When the token stops being valid, if known
    pub expires_on: Option<SystemTime>,
}

impl AccessToken {
    /// Create a token without expiry information
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_on: None,
        }
    }

    /// Create a token that expires `expires_in` seconds from now
    pub fn with_expiry(token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            token: token.into(),
            expires_on: Some(SystemTime::now() + Duration::from_secs(expires_in)),
        }
    }

    /// Whether the token is within `leeway` of its expiry
    ///
    /// Tokens without expiry information never report as expired.
    pub fn is_expired(&self, leeway: Duration) -> bool {
        match self.expires_on {
            Some(expires_on) => SystemTime::now() + leeway >= expires_on,
            None => false,
        }
    }
}

/// Errors that can occur while acquiring a token
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential not available: {0}")]
    NotAvailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {message}")]
    TokenRequest { status: u16, message: String },

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("No credential source could provide a token (tried: {0})")]
    Exhausted(String),
}

impl CredentialError {
    /// Create a token request error from a non-success response
    pub fn token_request(status: u16, message: impl Into<String>) -> Self {
        Self::TokenRequest {
            status,
            message: message.into(),
        }
    }
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Trait for token acquisition
///
/// Implementations:
/// - `EnvironmentCredential`: client-credentials grant from environment variables
/// - `ManagedIdentityCredential`: instance metadata service on the host
/// - `ChainCredential`: ordered fallback over other credentials
/// - `StaticCredential`: fixed token for tests
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Human-readable name of this credential source
    fn name(&self) -> &str;

    /// Check if this source can be attempted at all
    ///
    /// For example, the environment credential is unavailable when its
    /// variables are unset.
    fn is_available(&self) -> bool {
        true
    }

    /// Acquire a bearer token for the given scope
    async fn get_token(&self, scope: &str) -> CredentialResult<AccessToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = AccessToken::new("tok");
        assert!(!token.is_expired(Duration::from_secs(0)));
        assert!(!token.is_expired(Duration::from_secs(3600)));
    }

    #[test]
    fn test_token_expiry_with_leeway() {
        let token = AccessToken::with_expiry("tok", 60);
        assert!(!token.is_expired(Duration::from_secs(0)));
        // 2 minutes of leeway pushes a 1 minute token past its expiry
        assert!(token.is_expired(Duration::from_secs(120)));
    }

    #[test]
    fn test_token_request_error_message() {
        let err = CredentialError::token_request(401, "bad client secret");
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad client secret"));
    }
}
