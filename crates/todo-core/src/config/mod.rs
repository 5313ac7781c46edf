//! Layered configuration
//!
//! This module provides the configuration layer of the bootstrap:
//! - `ConfigSource` trait for named get-if-present lookups
//! - Built-in sources: `MemoryConfigSource`, `EnvConfigSource`, `JsonFileConfigSource`
//! - `ConfigBuilder` merging an explicit ordered source list into an
//!   immutable `AppConfig` snapshot with per-key provenance
//! - `RuntimeEnvironment`, the explicit environment value the resolver
//!   branches on

mod traits;
mod environment;
mod memory;
mod env;
mod file;
mod snapshot;

pub use traits::{ConfigSource, ConfigError, ConfigResult};
pub use environment::{RuntimeEnvironment, ENVIRONMENT_VAR};
pub use memory::MemoryConfigSource;
pub use env::{EnvConfigSource, SECTION_SEPARATOR};
pub use file::JsonFileConfigSource;
pub use snapshot::{ConfigBuilder, AppConfig};
