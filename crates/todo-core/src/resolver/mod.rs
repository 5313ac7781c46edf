//! Secret resolution
//!
//! Layers vault secrets and the optional local secrets file on top of the
//! caller's base configuration, but only in production.

mod secret_resolver;

pub use secret_resolver::{
    ResolveError, ResolveResult, SecretResolver, VaultOpener, DEFAULT_SECRETS_FILE,
    KEY_VAULT_NAME_KEY,
};
