//! Concurrent TTL-bound secret store.
//!
//! The store is the only mutable state shared between the foreground fetch
//! path and the background refresh task. Entries are replaced atomically,
//! never mutated in place: a reader sees either the prior entry or the fully
//! updated one, never a mix of old value with new expiry.
//!
//! Expired entries are not evicted. They persist until a successful refresh
//! overwrites them (or the process ends), which is what makes stale-serve
//! fallback possible when the backend is down. [`SecretStore::invalidate`]
//! and [`SecretStore::clear`] are manual escape hatches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::SecretValue;

/// A cached secret with its lifetime bounds.
///
/// Immutable once constructed; refresh replaces the whole entry.
/// Invariant: `expires_at > created_at`.
#[derive(Debug, Clone)]
pub struct CachedSecret {
    value: SecretValue,
    created_at: Instant,
    expires_at: Instant,
}

impl CachedSecret {
    fn new(value: SecretValue, ttl: Duration) -> Self {
        let now = Instant::now();
        Self { value, created_at: now, expires_at: now + ttl }
    }

    /// The cached secret value.
    pub fn value(&self) -> &SecretValue {
        &self.value
    }

    /// When this entry was written.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When this entry stops being fresh.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Whether the entry is stale as of `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe mapping from secret key to [`CachedSecret`].
///
/// Cheaply cloneable; clones share the same underlying map. The foreground
/// fetch path and the background refresh task synchronize only through this
/// store's operations.
#[derive(Debug)]
pub struct SecretStore {
    inner: Arc<RwLock<HashMap<String, CachedSecret>>>,
}

impl SecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Get the cached entry for a key, expired or not.
    ///
    /// Freshness is the caller's decision via [`CachedSecret::is_expired`];
    /// the stale entry is still needed for fallback serving.
    pub async fn get(&self, key: &str) -> Option<CachedSecret> {
        self.inner.read().await.get(key).cloned()
    }

    /// Atomically replace the entry for a key with a fresh one.
    ///
    /// The new entry's expiry is `now + ttl`, regardless of how much
    /// freshness the previous entry had left.
    pub async fn put(&self, key: &str, value: SecretValue, ttl: Duration) {
        let entry = CachedSecret::new(value, ttl);
        let mut map = self.inner.write().await;
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Caching secret");
        map.insert(key.to_string(), entry);
    }

    /// Point-in-time copy of the resident key set.
    ///
    /// The refresh task iterates this snapshot, so refresh is never blocked
    /// by concurrent mutation; keys added mid-refresh are picked up on the
    /// next tick.
    pub async fn keys_snapshot(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    /// Remove a single entry.
    pub async fn invalidate(&self, key: &str) {
        let mut map = self.inner.write().await;
        if map.remove(key).is_some() {
            debug!(key = %key, "Invalidated cached secret");
        }
    }

    /// Remove all entries.
    pub async fn clear(&self) {
        let mut map = self.inner.write().await;
        let count = map.len();
        map.clear();
        debug!(count, "Cleared secret store");
    }

    /// Number of resident entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Clone for SecretStore {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SecretStore::new();
        store.put("db.password", SecretValue::new("s3cr3t"), Duration::from_secs(60)).await;

        let entry = store.get("db.password").await.unwrap();
        assert_eq!(entry.value().expose(), "s3cr3t");
        assert!(!entry.is_expired(Instant::now()));
        assert!(entry.expires_at() > entry.created_at());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = SecretStore::new();
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_persists() {
        let store = SecretStore::new();
        store.put("api_key", SecretValue::new("old"), Duration::from_millis(10)).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        // Stale entries are kept for fallback serving, not evicted.
        let entry = store.get("api_key").await.unwrap();
        assert!(entry.is_expired(Instant::now()));
        assert_eq!(entry.value().expose(), "old");
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let store = SecretStore::new();
        store.put("token", SecretValue::new("first"), Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.put("token", SecretValue::new("second"), Duration::from_secs(60)).await;

        let entry = store.get("token").await.unwrap();
        assert_eq!(entry.value().expose(), "second");
        assert!(!entry.is_expired(Instant::now()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_snapshot_is_a_copy() {
        let store = SecretStore::new();
        store.put("a", SecretValue::new("1"), Duration::from_secs(60)).await;
        store.put("b", SecretValue::new("2"), Duration::from_secs(60)).await;

        let mut snapshot = store.keys_snapshot().await;
        snapshot.sort();
        assert_eq!(snapshot, vec!["a".to_string(), "b".to_string()]);

        // Mutating the store after the snapshot does not change it.
        store.put("c", SecretValue::new("3"), Duration::from_secs(60)).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let store = SecretStore::new();
        store.put("a", SecretValue::new("1"), Duration::from_secs(60)).await;
        store.put("b", SecretValue::new("2"), Duration::from_secs(60)).await;

        store.invalidate("a").await;
        assert!(store.get("a").await.is_none());
        assert_eq!(store.len().await, 1);

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SecretStore::new();
        let alias = store.clone();

        store.put("shared", SecretValue::new("v"), Duration::from_secs(60)).await;
        assert_eq!(alias.get("shared").await.unwrap().value().expose(), "v");
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_one_complete_entry() {
        let store = SecretStore::new();
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put("raced", SecretValue::new(format!("v{i}")), Duration::from_secs(60)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Last writer wins; the surviving entry is complete and valid.
        let entry = store.get("raced").await.unwrap();
        assert!(entry.value().expose().starts_with('v'));
        assert!(entry.expires_at() > entry.created_at());
        assert_eq!(store.len().await, 1);
    }
}
