//! Environment variable configuration source

use std::env;

use super::traits::ConfigSource;

/// Separator used in variable names where a config key has a `.`
///
/// `CosmosDb__DatabaseName` maps to the key `CosmosDb.DatabaseName`.
pub const SECTION_SEPARATOR: &str = "__";

/// Configuration source that reads from environment variables
///
/// This source is read-only. Dotted config keys map to variables with `__`
/// as the section separator, so `get("CosmosDb.DatabaseName")` checks, in
/// order:
///
/// 1. `CosmosDb.DatabaseName` (the key as-is)
/// 2. `CosmosDb__DatabaseName`
/// 3. `COSMOSDB__DATABASENAME`
///
/// A prefix can scope the source to variables that start with it; the prefix
/// is stripped from enumerated keys.
///
/// # Example
///
/// ```
/// use todo_core::config::{ConfigSource, EnvConfigSource};
///
/// std::env::set_var("TODO_CosmosDb__DatabaseName", "Todo");
/// let source = EnvConfigSource::with_prefix("TODO_");
/// assert_eq!(source.get("CosmosDb.DatabaseName"), Some("Todo".to_string()));
/// std::env::remove_var("TODO_CosmosDb__DatabaseName");
/// ```
#[derive(Debug, Default, Clone)]
pub struct EnvConfigSource {
    prefix: Option<String>,
}

impl EnvConfigSource {
    /// Create a source over the whole process environment
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Create a source scoped to variables starting with `prefix`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Variable names to try for a config key, in order
    fn candidates(&self, key: &str) -> Vec<String> {
        let prefix = self.prefix.as_deref().unwrap_or("");
        let mapped = key.replace('.', SECTION_SEPARATOR);
        let mut candidates = vec![format!("{}{}", prefix, key)];
        if mapped != key {
            candidates.push(format!("{}{}", prefix, mapped));
        }
        let upper = mapped.to_uppercase();
        if upper != mapped {
            candidates.push(format!("{}{}", prefix, upper));
        }
        candidates
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        for candidate in self.candidates(key) {
            if let Ok(value) = env::var(&candidate) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
        None
    }

    fn keys(&self) -> Vec<String> {
        let prefix = self.prefix.as_deref().unwrap_or("");
        env::vars()
            .filter_map(|(name, value)| {
                if value.is_empty() {
                    return None;
                }
                let stripped = name.strip_prefix(prefix)?;
                if stripped.is_empty() {
                    return None;
                }
                Some(stripped.replace(SECTION_SEPARATOR, "."))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_source_name() {
        let source = EnvConfigSource::new();
        assert_eq!(source.name(), "env");
    }

    #[test]
    fn test_env_source_direct_key() {
        env::set_var("TEST_ENV_SOURCE_DIRECT", "direct-value");

        let source = EnvConfigSource::new();
        assert_eq!(
            source.get("TEST_ENV_SOURCE_DIRECT"),
            Some("direct-value".to_string())
        );

        env::remove_var("TEST_ENV_SOURCE_DIRECT");
    }

    #[test]
    fn test_env_source_section_mapping() {
        env::set_var("TestSection__Nested", "nested-value");

        let source = EnvConfigSource::new();
        assert_eq!(
            source.get("TestSection.Nested"),
            Some("nested-value".to_string())
        );

        env::remove_var("TestSection__Nested");
    }

    #[test]
    fn test_env_source_uppercase_fallback() {
        env::set_var("TESTUPPER__VALUE", "shouting");

        let source = EnvConfigSource::new();
        assert_eq!(source.get("TestUpper.Value"), Some("shouting".to_string()));

        env::remove_var("TESTUPPER__VALUE");
    }

    #[test]
    fn test_env_source_empty_value_is_missing() {
        env::set_var("TEST_ENV_SOURCE_EMPTY", "");

        let source = EnvConfigSource::new();
        assert_eq!(source.get("TEST_ENV_SOURCE_EMPTY"), None);

        env::remove_var("TEST_ENV_SOURCE_EMPTY");
    }

    #[test]
    fn test_env_source_prefix() {
        env::set_var("TODOTEST_CosmosDb__DatabaseName", "FromEnv");
        env::set_var("TODOTEST_Plain", "plain");

        let source = EnvConfigSource::with_prefix("TODOTEST_");
        assert_eq!(
            source.get("CosmosDb.DatabaseName"),
            Some("FromEnv".to_string())
        );
        assert_eq!(source.get("Plain"), Some("plain".to_string()));

        let keys = source.keys();
        assert!(keys.contains(&"CosmosDb.DatabaseName".to_string()));
        assert!(keys.contains(&"Plain".to_string()));

        env::remove_var("TODOTEST_CosmosDb__DatabaseName");
        env::remove_var("TODOTEST_Plain");
    }

    #[test]
    fn test_env_source_not_found() {
        let source = EnvConfigSource::new();
        assert_eq!(source.get("Nonexistent.Key.Xyz"), None);
    }
}
