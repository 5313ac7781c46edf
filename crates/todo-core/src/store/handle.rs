//! Process-lifetime handle to the provisioned store

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::traits::{DocumentStore, StoreError, StoreResult};

/// Handle scoped to the provisioned database and container
///
/// Bootstrap hands the application exactly one of these; it is cheap to
/// clone and share with whatever serves requests. Items are addressed by
/// their `id` field, which doubles as the partition key value.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde::{Deserialize, Serialize};
/// use todo_core::store::{DataAccessHandle, MockDocumentStore};
///
/// #[derive(Serialize, Deserialize)]
/// struct Task {
///     id: String,
///     name: String,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = Arc::new(MockDocumentStore::new().with_container("Tasks", "Items"));
/// let handle = DataAccessHandle::new(store, "Tasks", "Items");
///
/// let task = Task { id: "1".into(), name: "water plants".into() };
/// handle.upsert_item(&task).await.unwrap();
/// let found: Option<Task> = handle.get_item("1").await.unwrap();
/// assert_eq!(found.unwrap().name, "water plants");
/// # });
/// ```
#[derive(Clone)]
pub struct DataAccessHandle {
    store: Arc<dyn DocumentStore>,
    database: String,
    container: String,
}

impl DataAccessHandle {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            store,
            database: database.into(),
            container: container.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Endpoint of the underlying store
    pub fn endpoint(&self) -> &str {
        self.store.endpoint()
    }

    /// Insert or replace an item
    ///
    /// The item must serialize with a string `id` field; anything else
    /// fails with [`StoreError::MissingId`].
    pub async fn upsert_item<T: Serialize>(&self, item: &T) -> StoreResult<()> {
        let value = serde_json::to_value(item)?;
        let id = value
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or(StoreError::MissingId)?;
        self.store
            .upsert_item(&self.database, &self.container, &id, value)
            .await
    }

    /// Fetch a single item by id, `None` when absent
    pub async fn get_item<T: DeserializeOwned>(&self, id: &str) -> StoreResult<Option<T>> {
        match self
            .store
            .read_item(&self.database, &self.container, id, id)
            .await?
        {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Delete an item by id
    pub async fn delete_item(&self, id: &str) -> StoreResult<()> {
        self.store
            .delete_item(&self.database, &self.container, id, id)
            .await
    }

    /// Fetch every item in the container
    pub async fn list_items<T: DeserializeOwned>(&self) -> StoreResult<Vec<T>> {
        let values = self
            .store
            .list_items(&self.database, &self.container)
            .await?;
        values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(StoreError::from)
    }
}

impl std::fmt::Debug for DataAccessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataAccessHandle")
            .field("store", &self.store.name())
            .field("database", &self.database)
            .field("container", &self.container)
            .finish()
    }
}
