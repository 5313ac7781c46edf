//! JSON file configuration source
//!
//! Reads appsettings-style JSON documents. Nested objects flatten to dotted
//! keys (`{"CosmosDb": {"DatabaseName": "Todo"}}` becomes
//! `CosmosDb.DatabaseName`), arrays flatten with numeric segments.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::traits::{ConfigError, ConfigResult, ConfigSource};

/// Configuration source backed by a JSON settings file
///
/// The file is read once at construction; the source holds the flattened
/// entries and never touches the file again. Use [`JsonFileConfigSource::load`]
/// when the file must exist and [`JsonFileConfigSource::load_optional`] for
/// files that may legitimately be absent (such as a mounted secrets file).
///
/// # Example
///
/// ```no_run
/// use todo_core::config::JsonFileConfigSource;
///
/// let source = JsonFileConfigSource::load("appsettings.json")?;
/// # Ok::<(), todo_core::config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileConfigSource {
    path: PathBuf,
    name: String,
    entries: HashMap<String, String>,
}

impl JsonFileConfigSource {
    /// Load a settings file that must exist
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        Self::from_content(path, &content)
    }

    /// Load a settings file that may be absent
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that exists
    /// but cannot be read or parsed is still an error.
    pub fn load_optional(path: impl Into<PathBuf>) -> ConfigResult<Option<Self>> {
        let path = path.into();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    fn from_content(path: PathBuf, content: &str) -> ConfigResult<Self> {
        let display = path.display().to_string();
        let root: Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::parse(&display, e.to_string()))?;

        let object = match root {
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::parse(
                    &display,
                    "top-level value must be a JSON object",
                ))
            }
        };

        let mut entries = HashMap::new();
        for (key, value) in object {
            flatten(&key, &value, &mut entries);
        }

        let name = match path.file_name() {
            Some(file_name) => format!("file:{}", file_name.to_string_lossy()),
            None => "file".to_string(),
        };

        Ok(Self {
            path,
            name,
            entries,
        })
    }

    /// Path the source was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of flattened entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the file held no settings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flatten a JSON value into dotted-key entries
fn flatten(prefix: &str, value: &Value, entries: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten(&format!("{}.{}", prefix, key), nested, entries);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten(&format!("{}.{}", prefix, index), nested, entries);
            }
        }
        Value::String(s) => {
            entries.insert(prefix.to_string(), s.clone());
        }
        Value::Null => {
            entries.insert(prefix.to_string(), String::new());
        }
        other => {
            entries.insert(prefix.to_string(), other.to_string());
        }
    }
}

impl ConfigSource for JsonFileConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
