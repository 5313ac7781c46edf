//! Managed identity credential (instance metadata service)

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{AccessToken, CredentialError, CredentialResult, TokenCredential};

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";

/// How long to wait for the metadata service before concluding it is absent
///
/// Off the platform the endpoint does not answer, so the probe must fail
/// fast for the chain to fall through.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Credential backed by the host's instance metadata service
///
/// Requests tokens from the local metadata endpoint, which is only reachable
/// when the process runs on platform infrastructure with a managed identity
/// assigned. Anywhere else the request times out quickly and the credential
/// reports itself unavailable.
pub struct ManagedIdentityCredential {
    client: reqwest::Client,
    endpoint: String,
    probe_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ImdsTokenResponse {
    access_token: String,
    /// The metadata service returns this as a string
    #[serde(default)]
    expires_in: Option<String>,
}

impl ManagedIdentityCredential {
    /// Create a credential against the standard metadata endpoint
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: IMDS_ENDPOINT.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the metadata endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

/// The metadata service wants the bare resource URI, not an OAuth scope
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &str {
        "managed-identity"
    }

    async fn get_token(&self, scope: &str) -> CredentialResult<AccessToken> {
        let resource = scope_to_resource(scope);
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("api-version", IMDS_API_VERSION), ("resource", resource)])
            .header("Metadata", "true")
            .send();

        let response = match tokio::time::timeout(self.probe_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                // Connection failures mean there is no metadata service here
                return Err(CredentialError::NotAvailable(format!(
                    "metadata service unreachable: {}",
                    e
                )));
            }
            Err(_) => {
                return Err(CredentialError::NotAvailable(
                    "metadata service did not answer within the probe timeout".to_string(),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::token_request(status.as_u16(), body));
        }

        let token: ImdsTokenResponse = response.json().await?;
        let expires_in = token.expires_in.as_deref().and_then(|s| s.parse::<u64>().ok());
        match expires_in {
            Some(expires_in) => Ok(AccessToken::with_expiry(token.access_token, expires_in)),
            None => Ok(AccessToken::new(token.access_token)),
        }
    }
}
