//! In-memory document store for testing

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::traits::{DocumentStore, ProvisionOutcome, StoreError, StoreResult};

/// In-memory store that records every operation it serves
///
/// Fixtures can pre-create databases and containers to exercise the
/// already-exists paths, or be put into a failing mode where every
/// operation returns a service error.
///
/// # Example
///
/// ```
/// use todo_core::store::{DocumentStore, MockDocumentStore, ProvisionOutcome};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MockDocumentStore::new().with_database("todos");
/// let outcome = store.create_database_if_absent("todos").await.unwrap();
/// assert_eq!(outcome, ProvisionOutcome::AlreadyExists);
/// # });
/// ```
pub struct MockDocumentStore {
    endpoint: String,
    databases: RwLock<HashSet<String>>,
    containers: RwLock<HashSet<(String, String)>>,
    items: RwLock<HashMap<(String, String), BTreeMap<String, Value>>>,
    operations: RwLock<Vec<String>>,
    failure: Option<String>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            endpoint: "memory://mock".to_string(),
            databases: RwLock::new(HashSet::new()),
            containers: RwLock::new(HashSet::new()),
            items: RwLock::new(HashMap::new()),
            operations: RwLock::new(Vec::new()),
            failure: None,
        }
    }

    /// Create a store where every operation fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.failure = Some(message.into());
        store
    }

    /// Pre-create a database
    pub fn with_database(self, database: impl Into<String>) -> Self {
        self.databases.write().unwrap().insert(database.into());
        self
    }

    /// Pre-create a container along with its database
    pub fn with_container(self, database: impl Into<String>, container: impl Into<String>) -> Self {
        let database = database.into();
        self.databases.write().unwrap().insert(database.clone());
        self.containers
            .write()
            .unwrap()
            .insert((database, container.into()));
        self
    }

    /// Every operation served so far, in order
    pub fn operations(&self) -> Vec<String> {
        self.operations.read().unwrap().clone()
    }

    pub fn database_exists(&self, database: &str) -> bool {
        self.databases.read().unwrap().contains(database)
    }

    pub fn container_exists(&self, database: &str, container: &str) -> bool {
        self.containers
            .read()
            .unwrap()
            .contains(&(database.to_string(), container.to_string()))
    }

    pub fn item_count(&self, database: &str, container: &str) -> usize {
        self.items
            .read()
            .unwrap()
            .get(&(database.to_string(), container.to_string()))
            .map(|items| items.len())
            .unwrap_or(0)
    }

    fn record(&self, operation: String) {
        self.operations.write().unwrap().push(operation);
    }

    fn check_failure(&self) -> StoreResult<()> {
        match &self.failure {
            Some(message) => Err(StoreError::status(503, message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_database_if_absent(&self, database: &str) -> StoreResult<ProvisionOutcome> {
        self.record(format!("create_database {}", database));
        self.check_failure()?;

        if self.databases.write().unwrap().insert(database.to_string()) {
            Ok(ProvisionOutcome::Created)
        } else {
            Ok(ProvisionOutcome::AlreadyExists)
        }
    }

    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<ProvisionOutcome> {
        self.record(format!(
            "create_container {}/{} pk={}",
            database, container, partition_key_path
        ));
        self.check_failure()?;

        if !self.database_exists(database) {
            return Err(StoreError::status(
                404,
                format!("Database '{}' not found", database),
            ));
        }
        let key = (database.to_string(), container.to_string());
        if self.containers.write().unwrap().insert(key) {
            Ok(ProvisionOutcome::Created)
        } else {
            Ok(ProvisionOutcome::AlreadyExists)
        }
    }

    async fn upsert_item(
        &self,
        database: &str,
        container: &str,
        _partition_key: &str,
        item: Value,
    ) -> StoreResult<()> {
        let id = match item.get("id").and_then(|id| id.as_str()) {
            Some(id) => id.to_string(),
            None => return Err(StoreError::status(400, "Document has no id")),
        };
        self.record(format!("upsert {}/{}/{}", database, container, id));
        self.check_failure()?;

        if !self.container_exists(database, container) {
            return Err(StoreError::status(
                404,
                format!("Container '{}' not found", container),
            ));
        }
        self.items
            .write()
            .unwrap()
            .entry((database.to_string(), container.to_string()))
            .or_default()
            .insert(id, item);
        Ok(())
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        _partition_key: &str,
        id: &str,
    ) -> StoreResult<Option<Value>> {
        self.record(format!("read {}/{}/{}", database, container, id));
        self.check_failure()?;

        let items = self.items.read().unwrap();
        Ok(items
            .get(&(database.to_string(), container.to_string()))
            .and_then(|container_items| container_items.get(id))
            .cloned())
    }

    async fn delete_item(
        &self,
        database: &str,
        container: &str,
        _partition_key: &str,
        id: &str,
    ) -> StoreResult<()> {
        self.record(format!("delete {}/{}/{}", database, container, id));
        self.check_failure()?;

        let removed = self
            .items
            .write()
            .unwrap()
            .get_mut(&(database.to_string(), container.to_string()))
            .and_then(|container_items| container_items.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("Item '{}'", id))),
        }
    }

    async fn list_items(&self, database: &str, container: &str) -> StoreResult<Vec<Value>> {
        self.record(format!("list {}/{}", database, container));
        self.check_failure()?;

        if !self.container_exists(database, container) {
            return Err(StoreError::status(
                404,
                format!("Container '{}' not found", container),
            ));
        }
        let items = self.items.read().unwrap();
        Ok(items
            .get(&(database.to_string(), container.to_string()))
            .map(|container_items| container_items.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for MockDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDocumentStore")
            .field("endpoint", &self.endpoint)
            .field("failure", &self.failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_database_is_idempotent() {
        let store = MockDocumentStore::new();

        let first = store.create_database_if_absent("db").await.unwrap();
        let second = store.create_database_if_absent("db").await.unwrap();

        assert_eq!(first, ProvisionOutcome::Created);
        assert_eq!(second, ProvisionOutcome::AlreadyExists);
        assert!(store.database_exists("db"));
    }

    #[tokio::test]
    async fn test_container_requires_database() {
        let store = MockDocumentStore::new();

        let err = store
            .create_container_if_absent("missing", "items", "/id")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 404, .. }));

        store.create_database_if_absent("db").await.unwrap();
        let outcome = store
            .create_container_if_absent("db", "items", "/id")
            .await
            .unwrap();
        assert_eq!(outcome, ProvisionOutcome::Created);
    }

    #[tokio::test]
    async fn test_operations_are_recorded_in_order() {
        let store = MockDocumentStore::new();

        store.create_database_if_absent("db").await.unwrap();
        store
            .create_container_if_absent("db", "items", "/id")
            .await
            .unwrap();

        assert_eq!(
            store.operations(),
            vec![
                "create_database db".to_string(),
                "create_container db/items pk=/id".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_store_rejects_everything() {
        let store = MockDocumentStore::failing("service down");

        let err = store.create_database_if_absent("db").await.unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 503, .. }));
        assert_eq!(store.operations().len(), 1);
    }

    #[tokio::test]
    async fn test_item_round_trip() {
        let store = MockDocumentStore::new().with_container("db", "items");

        store
            .upsert_item("db", "items", "1", json!({"id": "1", "name": "milk"}))
            .await
            .unwrap();
        let item = store.read_item("db", "items", "1", "1").await.unwrap();
        assert_eq!(item.unwrap()["name"], "milk");

        assert_eq!(store.list_items("db", "items").await.unwrap().len(), 1);

        store.delete_item("db", "items", "1", "1").await.unwrap();
        assert_eq!(store.read_item("db", "items", "1", "1").await.unwrap(), None);

        let err = store.delete_item("db", "items", "1", "1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_item() {
        let store = MockDocumentStore::new().with_container("db", "items");

        store
            .upsert_item("db", "items", "1", json!({"id": "1", "done": false}))
            .await
            .unwrap();
        store
            .upsert_item("db", "items", "1", json!({"id": "1", "done": true}))
            .await
            .unwrap();

        assert_eq!(store.item_count("db", "items"), 1);
        let item = store.read_item("db", "items", "1", "1").await.unwrap();
        assert_eq!(item.unwrap()["done"], true);
    }
}
