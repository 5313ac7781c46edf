//! Chained token credential with fallback behavior

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;

use super::env::EnvironmentCredential;
use super::imds::ManagedIdentityCredential;
use super::traits::{AccessToken, CredentialError, CredentialResult, TokenCredential};

/// Tokens this close to expiry are refreshed instead of reused
const EXPIRY_LEEWAY: Duration = Duration::from_secs(120);

/// A credential that tries multiple sources in order
///
/// The first source to produce a token is remembered and used directly for
/// later requests. Tokens are cached per scope until they near expiry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todo_core::credentials::{ChainCredential, StaticCredential, TokenCredential};
///
/// let chain = ChainCredential::new(vec![Arc::new(StaticCredential::new("tok"))]);
/// assert_eq!(chain.name(), "chain");
/// ```
pub struct ChainCredential {
    sources: Vec<Arc<dyn TokenCredential>>,
    /// Index of the first source that succeeded
    selected: OnceCell<usize>,
    cache: RwLock<HashMap<String, AccessToken>>,
}

impl ChainCredential {
    /// Create a new chain
    ///
    /// Sources are tried in order.
    pub fn new(sources: Vec<Arc<dyn TokenCredential>>) -> Self {
        if sources.is_empty() {
            panic!("ChainCredential requires at least one source");
        }
        Self {
            sources,
            selected: OnceCell::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The ambient credential chain for this application
    ///
    /// Environment service principal first, then the host's managed
    /// identity. This is what the vault client and the document store use
    /// when nothing else is injected.
    pub fn ambient() -> Self {
        Self::new(vec![
            Arc::new(EnvironmentCredential::new()),
            Arc::new(ManagedIdentityCredential::new()),
        ])
    }

    /// The sources in this chain
    pub fn sources(&self) -> &[Arc<dyn TokenCredential>] {
        &self.sources
    }

    fn cached(&self, scope: &str) -> Option<AccessToken> {
        let cache = self.cache.read().unwrap();
        cache
            .get(scope)
            .filter(|token| !token.is_expired(EXPIRY_LEEWAY))
            .cloned()
    }

    fn remember(&self, scope: &str, token: &AccessToken) {
        let mut cache = self.cache.write().unwrap();
        cache.insert(scope.to_string(), token.clone());
    }
}

#[async_trait]
impl TokenCredential for ChainCredential {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.sources.iter().any(|s| s.is_available())
    }

    async fn get_token(&self, scope: &str) -> CredentialResult<AccessToken> {
        if let Some(token) = self.cached(scope) {
            return Ok(token);
        }

        // A source that worked before is asked directly
        if let Some(&index) = self.selected.get() {
            let token = self.sources[index].get_token(scope).await?;
            self.remember(scope, &token);
            return Ok(token);
        }

        let mut attempts = Vec::new();
        for (index, source) in self.sources.iter().enumerate() {
            if !source.is_available() {
                attempts.push(format!("{} (unavailable)", source.name()));
                continue;
            }
            match source.get_token(scope).await {
                Ok(token) => {
                    let _ = self.selected.set(index);
                    self.remember(scope, &token);
                    return Ok(token);
                }
                Err(e) => attempts.push(format!("{}: {}", source.name(), e)),
            }
        }

        Err(CredentialError::Exhausted(attempts.join("; ")))
    }
}

impl std::fmt::Debug for ChainCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainCredential")
            .field("sources", &names)
            .field("selected", &self.selected.get())
            .finish()
    }
}
