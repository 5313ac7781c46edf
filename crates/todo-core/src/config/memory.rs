//! In-memory configuration source

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::ConfigSource;

/// In-memory configuration source
///
/// Holds a named set of key/value settings. Used for the built-in defaults
/// layer, for staging vault secrets after they are fetched, and in tests.
///
/// # Thread Safety
///
/// Values sit behind an `RwLock` and the source is safe to share across
/// threads. Once the source has been merged into a snapshot, later mutations
/// do not affect the snapshot.
///
/// # Example
///
/// ```
/// use todo_core::config::{ConfigSource, MemoryConfigSource};
///
/// let source = MemoryConfigSource::new("defaults");
/// source.set("CosmosDb.ContainerName", "Items");
/// assert_eq!(source.get("CosmosDb.ContainerName"), Some("Items".to_string()));
/// ```
#[derive(Debug)]
pub struct MemoryConfigSource {
    name: String,
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigSource {
    /// Create a new empty source with the given provenance name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Create a source with initial values
    pub fn with_values(name: impl Into<String>, initial: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(initial),
        }
    }

    /// Set a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap();
        values.insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&self, key: &str) {
        let mut values = self.values.write().unwrap();
        values.remove(key);
    }

    /// Number of values in the source
    pub fn len(&self) -> usize {
        let values = self.values.read().unwrap();
        values.len()
    }

    /// Check if the source is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigSource for MemoryConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap();
        values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let values = self.values.read().unwrap();
        values.keys().cloned().collect()
    }
}

impl Clone for MemoryConfigSource {
    fn clone(&self) -> Self {
        let values = self.values.read().unwrap();
        Self {
            name: self.name.clone(),
            values: RwLock::new(values.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_name() {
        let source = MemoryConfigSource::new("defaults");
        assert_eq!(source.name(), "defaults");
    }

    #[test]
    fn test_memory_source_set_get_remove() {
        let source = MemoryConfigSource::new("test");

        assert!(source.is_empty());
        assert_eq!(source.get("key"), None);

        source.set("key", "value");
        assert_eq!(source.len(), 1);
        assert_eq!(source.get("key"), Some("value".to_string()));

        source.set("key", "updated");
        assert_eq!(source.get("key"), Some("updated".to_string()));

        source.remove("key");
        assert_eq!(source.get("key"), None);
        assert!(source.is_empty());
    }

    #[test]
    fn test_memory_source_with_values() {
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), "1".to_string());
        initial.insert("b".to_string(), "2".to_string());

        let source = MemoryConfigSource::with_values("seed", initial);

        assert_eq!(source.len(), 2);
        assert_eq!(source.get("a"), Some("1".to_string()));
        assert_eq!(source.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_memory_source_keys() {
        let source = MemoryConfigSource::new("test");
        source.set("one", "1");
        source.set("two", "2");

        let mut keys = source.keys();
        keys.sort();
        assert_eq!(keys, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_memory_source_clone_is_independent() {
        let source = MemoryConfigSource::new("test");
        source.set("key", "value");

        let cloned = source.clone();
        cloned.set("key", "modified");

        assert_eq!(source.get("key"), Some("value".to_string()));
        assert_eq!(cloned.get("key"), Some("modified".to_string()));
    }
}
