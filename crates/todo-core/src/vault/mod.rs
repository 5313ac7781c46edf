//! Secret vault access
//!
//! This module provides startup-time secret fetching:
//! - `SecretVault` trait with the one-shot `fetch_all` operation
//! - `VaultClient`, the REST client for the hosted key vault
//! - `MockVault` for tests
//!
//! Secret names map to config keys with `--` standing in for `.`.

mod traits;
mod client;
mod mock;

pub use traits::{SecretVault, VaultSecret, VaultError, VaultResult, NAME_SEPARATOR};
pub use client::VaultClient;
pub use mock::MockVault;
