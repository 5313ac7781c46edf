//! Environment variable credential (client-credentials grant)

use std::env;

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{AccessToken, CredentialError, CredentialResult, TokenCredential};

/// Environment variables holding the service principal identity
pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Credential backed by a service principal configured in the environment
///
/// Reads `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET` and
/// exchanges them for a token with a client-credentials grant. Reports
/// unavailable when any of the three variables is unset, so a chain can move
/// on to the next source without a network round trip.
pub struct EnvironmentCredential {
    client: reqwest::Client,
    authority: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl EnvironmentCredential {
    /// Create a credential against the public authority
    pub fn new() -> Self {
        Self::with_authority(DEFAULT_AUTHORITY)
    }

    /// Create a credential against a custom authority host
    pub fn with_authority(authority: impl Into<String>) -> Self {
        let mut authority = authority.into();
        while authority.ends_with('/') {
            authority.pop();
        }
        Self {
            client: reqwest::Client::new(),
            authority,
        }
    }

    fn identity(&self) -> Option<(String, String, String)> {
        let tenant = non_empty_var(TENANT_ID_VAR)?;
        let client_id = non_empty_var(CLIENT_ID_VAR)?;
        let client_secret = non_empty_var(CLIENT_SECRET_VAR)?;
        Some((tenant, client_id, client_secret))
    }
}

impl Default for EnvironmentCredential {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &str {
        "environment"
    }

    fn is_available(&self) -> bool {
        self.identity().is_some()
    }

    async fn get_token(&self, scope: &str) -> CredentialResult<AccessToken> {
        let (tenant, client_id, client_secret) = self.identity().ok_or_else(|| {
            CredentialError::NotAvailable(
                "environment credential variables are not set".to_string(),
            )
        })?;

        let url = format!("{}/{}/oauth2/v2.0/token", self.authority, tenant);
        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", scope),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::token_request(status.as_u16(), body));
        }

        let token: TokenResponse = response.json().await?;
        match token.expires_in {
            Some(expires_in) => Ok(AccessToken::with_expiry(token.access_token, expires_in)),
            None => Ok(AccessToken::new(token.access_token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_credential_name() {
        let credential = EnvironmentCredential::new();
        assert_eq!(credential.name(), "environment");
    }

    #[test]
    fn test_authority_trailing_slash_is_trimmed() {
        let credential = EnvironmentCredential::with_authority("https://login.example.com/");
        assert_eq!(credential.authority, "https://login.example.com");
    }

    #[test]
    fn test_token_response_parses() {
        let json = r#"{"token_type": "Bearer", "expires_in": 3599, "access_token": "abc"}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.expires_in, Some(3599));
    }
}
