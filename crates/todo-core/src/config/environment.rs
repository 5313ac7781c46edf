//! Runtime environment detection

use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable that selects the runtime environment
pub const ENVIRONMENT_VAR: &str = "TODO_ENVIRONMENT";

/// The environment the process is running in
///
/// Secret resolution is conditional on this value: only `Production`
/// consults the vault and the local secrets file. The value is passed
/// explicitly into the resolver and bootstrapper rather than read from
/// ambient state, so tests can exercise every branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeEnvironment::Development => "Development",
            RuntimeEnvironment::Staging => "Staging",
            RuntimeEnvironment::Production => "Production",
        }
    }

    /// Whether this is the production environment
    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnvironment::Production)
    }

    /// Read the environment from `TODO_ENVIRONMENT`
    ///
    /// An unset or unrecognized value means `Production`, matching the
    /// hosting convention that an undeclared environment is treated as
    /// the strictest one.
    pub fn from_env() -> Self {
        match env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse().unwrap_or(RuntimeEnvironment::Production),
            Err(_) => RuntimeEnvironment::Production,
        }
    }
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        RuntimeEnvironment::Production
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeEnvironment::Development),
            "staging" => Ok(RuntimeEnvironment::Staging),
            "production" | "prod" => Ok(RuntimeEnvironment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}
