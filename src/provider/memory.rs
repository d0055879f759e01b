//! In-memory secret backend.
//!
//! Holds a map of secrets supplied at configuration time. Used as the
//! embedding default for local development and throughout the test suite,
//! where its call counter and failure injection make provider interactions
//! observable.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::{ProviderKind, SecretProvider};
use crate::error::{Result, SecretsError};
use crate::types::SecretValue;

/// In-memory secret backend.
///
/// # Example
///
/// ```rust
/// use keystash::provider::StaticProvider;
///
/// let provider = StaticProvider::new()
///     .with_secret("db.password", "s3cr3t")
///     .with_secret("api_key", "k-123");
/// ```
#[derive(Debug, Default)]
pub struct StaticProvider {
    values: RwLock<HashMap<String, String>>,
    failure: RwLock<Option<String>>,
    calls: AtomicU64,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret (builder form).
    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.write().unwrap().insert(key.into(), value.into());
        self
    }

    /// Insert or replace a secret.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().unwrap().insert(key.into(), value.into());
    }

    /// Remove a secret.
    pub fn remove(&self, key: &str) {
        self.values.write().unwrap().remove(key);
    }

    /// Make every subsequent `retrieve` fail with the given message,
    /// until [`clear_failure`](Self::clear_failure) is called.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().unwrap() = Some(message.into());
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        *self.failure.write().unwrap() = None;
    }

    /// Total number of `retrieve` calls observed, successful or not.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretProvider for StaticProvider {
    async fn retrieve(&self, key: &str) -> Result<SecretValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.read().unwrap().clone() {
            return Err(SecretsError::provider(key, message));
        }

        self.values
            .read()
            .unwrap()
            .get(key)
            .map(|v| SecretValue::new(v.clone()))
            .ok_or_else(|| SecretsError::provider(key, "not found"))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Static
    }
}
