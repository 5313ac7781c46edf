//! Key vault REST client

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::credentials::TokenCredential;
use super::traits::{SecretVault, VaultError, VaultResult, VaultSecret};

const API_VERSION: &str = "7.4";
const TOKEN_SCOPE: &str = "https://vault.azure.net/.default";

/// How many secret values to fetch in one concurrent batch
const FETCH_BATCH: usize = 8;

/// REST client for a hosted key vault
///
/// The endpoint follows the fixed naming convention
/// `https://<name>.vault.azure.net/`; only the vault name is configuration.
/// Authentication is a bearer token from the injected [`TokenCredential`].
///
/// [`fetch_all`](SecretVault::fetch_all) walks the paged secret list and
/// fetches each enabled secret's current value. Disabled secrets are
/// skipped.
pub struct VaultClient {
    name: String,
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SecretListPage {
    #[serde(default)]
    value: Vec<SecretItem>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretItem {
    id: String,
    #[serde(default)]
    attributes: SecretAttributes,
}

#[derive(Debug, Deserialize)]
struct SecretAttributes {
    #[serde(default = "enabled_default")]
    enabled: bool,
}

impl Default for SecretAttributes {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn enabled_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
    id: String,
}

impl VaultClient {
    /// Create a client for a vault by name
    pub fn from_name(name: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        let name = name.into();
        let endpoint = format!("https://{}.vault.azure.net/", name);
        Self {
            name,
            endpoint,
            credential,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client against an explicit endpoint
    ///
    /// Used for sovereign-cloud suffixes and for tests against a local stub.
    pub fn with_endpoint(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Self {
            name: name.into(),
            endpoint,
            credential,
            client: reqwest::Client::new(),
        }
    }

    async fn list_enabled(&self, bearer: &str) -> VaultResult<Vec<SecretItem>> {
        let mut items = Vec::new();
        let mut url = format!("{}secrets?api-version={}", self.endpoint, API_VERSION);
        loop {
            let response = self.client.get(&url).bearer_auth(bearer).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(VaultError::status(status.as_u16(), body));
            }
            let page: SecretListPage = response.json().await?;
            items.extend(page.value.into_iter().filter(|item| item.attributes.enabled));
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }
        Ok(items)
    }

    async fn fetch_value(&self, id: &str, bearer: &str) -> VaultResult<VaultSecret> {
        let url = format!("{}?api-version={}", id, API_VERSION);
        let response = self.client.get(&url).bearer_auth(bearer).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VaultError::status(status.as_u16(), body));
        }
        let bundle: SecretBundle = response.json().await?;
        let name = secret_name_from_id(&bundle.id).ok_or_else(|| {
            VaultError::InvalidResponse(format!("secret id has no name segment: {}", bundle.id))
        })?;
        Ok(VaultSecret::new(name, bundle.value))
    }
}

/// Extract the secret name from an identifier URL
///
/// Identifiers look like `https://<vault>/secrets/<name>` with an optional
/// trailing `/<version>`.
fn secret_name_from_id(id: &str) -> Option<String> {
    let mut segments = id.split('/');
    while let Some(segment) = segments.next() {
        if segment == "secrets" {
            return segments.next().filter(|name| !name.is_empty()).map(String::from);
        }
    }
    None
}

#[async_trait]
impl SecretVault for VaultClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_all(&self) -> VaultResult<Vec<VaultSecret>> {
        let token = self.credential.get_token(TOKEN_SCOPE).await?;
        let items = self.list_enabled(&token.token).await?;

        let mut secrets = Vec::with_capacity(items.len());
        for batch in items.chunks(FETCH_BATCH) {
            let fetches = batch.iter().map(|item| self.fetch_value(&item.id, &token.token));
            for fetched in futures::future::join_all(fetches).await {
                secrets.push(fetched?);
            }
        }
        Ok(secrets)
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
