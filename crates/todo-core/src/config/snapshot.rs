//! Layered configuration merged into an immutable snapshot

use std::collections::BTreeMap;
use std::sync::Arc;

use super::traits::{ConfigError, ConfigResult, ConfigSource};

/// One resolved setting with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigEntry {
    /// Key as written by the winning source
    key: String,
    value: String,
    /// Name of the source that supplied the value
    source: String,
}

/// Builder holding an explicit ordered list of configuration sources
///
/// Sources added later take precedence: when two sources provide the same
/// key, the later one wins. The canonical layering for this application is
///
/// 1. built-in defaults
/// 2. environment variables
/// 3. optional local secrets file (added by the secret resolver)
/// 4. vault secrets (added by the secret resolver, production only)
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todo_core::config::{ConfigBuilder, MemoryConfigSource};
///
/// let defaults = MemoryConfigSource::new("defaults");
/// defaults.set("CosmosDb.ContainerName", "Items");
///
/// let config = ConfigBuilder::new()
///     .add_source(Arc::new(defaults))
///     .build();
/// assert_eq!(config.get("CosmosDb.ContainerName"), Some("Items"));
/// ```
#[derive(Clone, Default)]
pub struct ConfigBuilder {
    sources: Vec<Arc<dyn ConfigSource>>,
}

impl ConfigBuilder {
    /// Create a builder with no sources
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a source at the highest precedence so far
    pub fn add_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// The sources in precedence order (lowest first)
    pub fn sources(&self) -> &[Arc<dyn ConfigSource>] {
        &self.sources
    }

    /// Merge all sources into an immutable snapshot
    ///
    /// The builder is left usable, so callers can snapshot an intermediate
    /// state and keep layering afterwards.
    pub fn build(&self) -> AppConfig {
        let mut entries: BTreeMap<String, ConfigEntry> = BTreeMap::new();
        for source in &self.sources {
            for key in source.keys() {
                if let Some(value) = source.get(&key) {
                    entries.insert(
                        key.to_lowercase(),
                        ConfigEntry {
                            key,
                            value,
                            source: source.name().to_string(),
                        },
                    );
                }
            }
        }
        AppConfig { entries }
    }
}

impl std::fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ConfigBuilder")
            .field("sources", &names)
            .finish()
    }
}

/// Immutable merged configuration snapshot
///
/// Lookups are case-insensitive. The snapshot records, per key, which source
/// supplied the winning value; there is no way to mutate it after
/// [`ConfigBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    entries: BTreeMap<String, ConfigEntry>,
}

impl AppConfig {
    /// Look up a value by key (case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|entry| entry.value.as_str())
    }

    /// Look up a required value
    ///
    /// An absent key, or a key whose value is empty, yields
    /// [`ConfigError::MissingKey`] naming the key.
    pub fn require(&self, key: &str) -> ConfigResult<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    /// Name of the source that supplied a key's value
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_lowercase())
            .map(|entry| entry.source.as_str())
    }

    /// Whether the snapshot holds a value for the key
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    /// Keys in the snapshot, as written by their winning sources
    pub fn keys(&self) -> Vec<&str> {
        self.entries.values().map(|entry| entry.key.as_str()).collect()
    }

    /// Number of settings in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
