//! Cosmos DB document store over the REST API
//!
//! Authenticates with AAD bearer tokens rather than master keys: the
//! token is wrapped in the `type=aad&ver=1.0&sig=...` authorization
//! format the service expects, URL-encoded as a single header value.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::credentials::TokenCredential;
use crate::store::traits::{DocumentStore, ProvisionOutcome, StoreError, StoreResult};

/// REST API version understood by the service
const API_VERSION: &str = "2018-12-31";

/// Document store backed by an Azure Cosmos DB account
///
/// All operations go through the data-plane REST API with per-request
/// AAD tokens scoped to the account endpoint.
pub struct CosmosStore {
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    client: reqwest::Client,
}

impl CosmosStore {
    /// Create a store for the given account endpoint
    pub fn new(endpoint: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            credential,
            client: reqwest::Client::new(),
        }
    }

    /// Token scope for this account
    fn token_scope(&self) -> String {
        format!("{}/.default", self.endpoint)
    }

    async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> StoreResult<reqwest::RequestBuilder> {
        let token = self.credential.get_token(&self.token_scope()).await?;
        Ok(request
            .header("authorization", auth_header(&token.token))
            .header("x-ms-date", rfc1123_now())
            .header("x-ms-version", API_VERSION))
    }

    async fn failure(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::status(status, message)
    }

    async fn create_resource(
        &self,
        url: String,
        body: Value,
    ) -> StoreResult<ProvisionOutcome> {
        let request = self.client.post(url).json(&body);
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(ProvisionOutcome::Created)
        } else if status.as_u16() == 409 {
            Ok(ProvisionOutcome::AlreadyExists)
        } else {
            Err(Self::failure(response).await)
        }
    }
}

#[async_trait]
impl DocumentStore for CosmosStore {
    fn name(&self) -> &str {
        "cosmos"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_database_if_absent(&self, database: &str) -> StoreResult<ProvisionOutcome> {
        let url = format!("{}/dbs", self.endpoint);
        self.create_resource(url, json!({ "id": database })).await
    }

    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<ProvisionOutcome> {
        let url = format!("{}/dbs/{}/colls", self.endpoint, database);
        let body = json!({
            "id": container,
            "partitionKey": {
                "paths": [partition_key_path],
                "kind": "Hash",
            },
        });
        self.create_resource(url, body).await
    }

    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        item: Value,
    ) -> StoreResult<()> {
        let url = format!("{}/dbs/{}/colls/{}/docs", self.endpoint, database, container);
        let request = self
            .client
            .post(url)
            .header("x-ms-documentdb-partitionkey", partition_key_header(partition_key))
            .header("x-ms-documentdb-is-upsert", "true")
            .json(&item);
        let response = self.authorize(request).await?.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        id: &str,
    ) -> StoreResult<Option<Value>> {
        let url = format!(
            "{}/dbs/{}/colls/{}/docs/{}",
            self.endpoint, database, container, id
        );
        let request = self
            .client
            .get(url)
            .header("x-ms-documentdb-partitionkey", partition_key_header(partition_key));
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if status.as_u16() == 404 {
            Ok(None)
        } else if status.is_success() {
            Ok(Some(response.json().await?))
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        id: &str,
    ) -> StoreResult<()> {
        let url = format!(
            "{}/dbs/{}/colls/{}/docs/{}",
            self.endpoint, database, container, id
        );
        let request = self
            .client
            .delete(url)
            .header("x-ms-documentdb-partitionkey", partition_key_header(partition_key));
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if status.as_u16() == 404 {
            Err(StoreError::NotFound(format!("Item '{}'", id)))
        } else if status.is_success() {
            Ok(())
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn list_items(&self, database: &str, container: &str) -> StoreResult<Vec<Value>> {
        let url = format!("{}/dbs/{}/colls/{}/docs", self.endpoint, database, container);
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone());
            if let Some(token) = &continuation {
                request = request.header("x-ms-continuation", token);
            }
            let response = self.authorize(request).await?.send().await?;

            if !response.status().is_success() {
                return Err(Self::failure(response).await);
            }

            continuation = response
                .headers()
                .get("x-ms-continuation")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string());

            let page: DocumentsPage = response.json().await?;
            items.extend(page.documents);

            if continuation.is_none() {
                return Ok(items);
            }
        }
    }
}

impl std::fmt::Debug for CosmosStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosStore")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// One page of a document feed
#[derive(Debug, Deserialize)]
struct DocumentsPage {
    #[serde(rename = "Documents", default)]
    documents: Vec<Value>,
}

/// Authorization header value for an AAD token
fn auth_header(token: &str) -> String {
    urlencoding::encode(&format!("type=aad&ver=1.0&sig={}", token)).into_owned()
}

/// Partition key header: a JSON array holding the key value
fn partition_key_header(partition_key: &str) -> String {
    format!("[{}]", Value::String(partition_key.to_string()))
}

/// Current time in the RFC 1123 format the service requires
fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredential;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let store = CosmosStore::new(
            "https://acct.documents.azure.com/",
            Arc::new(StaticCredential::new("tok")),
        );
        assert_eq!(store.endpoint(), "https://acct.documents.azure.com");
        assert_eq!(
            store.token_scope(),
            "https://acct.documents.azure.com/.default"
        );
    }

    #[test]
    fn test_auth_header_is_url_encoded() {
        assert_eq!(auth_header("tok"), "type%3Daad%26ver%3D1.0%26sig%3Dtok");
    }

    #[test]
    fn test_partition_key_header_is_json_array() {
        assert_eq!(partition_key_header("abc-123"), r#"["abc-123"]"#);
        assert_eq!(partition_key_header(r#"a"b"#), r#"["a\"b"]"#);
    }

    #[test]
    fn test_rfc1123_now_shape() {
        let date = rfc1123_now();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.matches(':').count(), 2);
        assert!(date.contains(", "));
    }

    #[test]
    fn test_documents_page_parses() {
        let page: DocumentsPage = serde_json::from_str(
            r#"{"_rid": "x", "Documents": [{"id": "1"}, {"id": "2"}], "_count": 2}"#,
        )
        .unwrap();
        assert_eq!(page.documents.len(), 2);

        let empty: DocumentsPage = serde_json::from_str(r#"{"_rid": "x"}"#).unwrap();
        assert!(empty.documents.is_empty());
    }
}
