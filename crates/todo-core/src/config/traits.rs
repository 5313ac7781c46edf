//! Core trait and error types for configuration sources

use thiserror::Error;

/// Errors that can occur during configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration key missing: {0}")]
    MissingKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Create a parse error for a file
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Trait for configuration sources
///
/// A source is a named, materialized set of key/value settings. Sources are
/// assembled into an explicit ordered list by [`ConfigBuilder`](super::ConfigBuilder);
/// later sources override earlier ones when the list is merged into a snapshot.
///
/// Implementations:
/// - In-memory values (`MemoryConfigSource`) for defaults and tests
/// - Process environment (`EnvConfigSource`)
/// - JSON settings files (`JsonFileConfigSource`)
/// - Vault secrets, staged by the secret resolver after fetching
///
/// # Example
///
/// ```
/// use todo_core::config::{ConfigSource, MemoryConfigSource};
///
/// let source = MemoryConfigSource::new("defaults");
/// source.set("CosmosDb.DatabaseName", "Todo");
/// assert_eq!(source.get("CosmosDb.DatabaseName"), Some("Todo".to_string()));
/// ```
pub trait ConfigSource: Send + Sync {
    /// Human-readable name of this source (used for provenance)
    fn name(&self) -> &str;

    /// Look up a value by key, if present
    fn get(&self, key: &str) -> Option<String>;

    /// Enumerate the keys this source can currently provide
    fn keys(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_names_the_key() {
        let err = ConfigError::MissingKey("CosmosEndpoint".to_string());
        assert!(err.to_string().contains("CosmosEndpoint"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = ConfigError::parse("secrets.json", "unexpected token");
        assert!(err.to_string().contains("secrets.json"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
