//! Token credentials for platform services
//!
//! This module provides the ambient credential machinery used by the vault
//! client and the document store:
//! - `TokenCredential` trait for token acquisition
//! - `EnvironmentCredential` (service principal from environment variables)
//! - `ManagedIdentityCredential` (instance metadata service)
//! - `ChainCredential` trying sources in order, remembering the first that works
//! - `StaticCredential` for tests

mod traits;
mod env;
mod imds;
mod chain;
mod fixed;

pub use traits::{TokenCredential, AccessToken, CredentialError, CredentialResult};
pub use env::{EnvironmentCredential, TENANT_ID_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR};
pub use imds::ManagedIdentityCredential;
pub use chain::ChainCredential;
pub use fixed::StaticCredential;
