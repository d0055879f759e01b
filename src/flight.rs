//! Single-flight collapsing for provider fetches.
//!
//! Many concurrent callers asking for the same cold or just-expired key must
//! not each hit the backend: one provider call runs per key at a time, and
//! every waiter observes that call's outcome. The call itself runs in a
//! spawned task, so a waiter that times out or is cancelled never aborts the
//! flight for the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::error::SecretsError;
use crate::provider::SecretProvider;
use crate::store::SecretStore;
use crate::types::SecretValue;

/// Shared outcome of one coalesced provider call, cloned to every waiter.
pub(crate) type FlightOutcome = std::result::Result<SecretValue, SecretsError>;

/// Per-key coalescing of concurrent provider fetches.
pub(crate) struct FlightGroup {
    inflight: Mutex<HashMap<String, broadcast::Sender<FlightOutcome>>>,
}

impl FlightGroup {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { inflight: Mutex::new(HashMap::new()) })
    }

    /// Fetch `key` through the group.
    ///
    /// Joins the in-progress flight for the key if one exists, otherwise
    /// starts one. On success the flight has already written the value
    /// through to the store with a full TTL.
    pub(crate) async fn fetch(
        self: &Arc<Self>,
        key: &str,
        provider: &Arc<dyn SecretProvider>,
        store: &SecretStore,
        ttl: Duration,
    ) -> FlightOutcome {
        loop {
            // Subscribe under the map lock: the flight task also takes this
            // lock to retire itself before publishing, so a subscriber can
            // never miss the outcome of a flight it found in the map.
            let mut rx = {
                let mut inflight = self.inflight.lock().await;
                match inflight.get(key) {
                    Some(tx) => {
                        debug!(key = %key, "Joining in-flight fetch");
                        tx.subscribe()
                    }
                    None => {
                        let (tx, rx) = broadcast::channel(1);
                        inflight.insert(key.to_string(), tx);
                        self.spawn_flight(key.to_string(), Arc::clone(provider), store.clone(), ttl);
                        rx
                    }
                }
            };

            match rx.recv().await {
                Ok(outcome) => return outcome,
                // Flight ended without publishing; start over.
                Err(_) => continue,
            }
        }
    }

    /// Run the provider call in its own task and publish the outcome.
    fn spawn_flight(
        self: &Arc<Self>,
        key: String,
        provider: Arc<dyn SecretProvider>,
        store: SecretStore,
        ttl: Duration,
    ) {
        let group = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = match provider.retrieve(&key).await {
                Ok(value) => {
                    store.put(&key, value.clone(), ttl).await;
                    Ok(value)
                }
                Err(e) => Err(e),
            };

            // Retire before publishing: callers arriving after this point
            // start a fresh flight instead of waiting on a finished one.
            let tx = group.inflight.lock().await.remove(&key);
            if let Some(tx) = tx {
                let _ = tx.send(outcome);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use futures::future::join_all;

    fn setup(provider: StaticProvider) -> (Arc<FlightGroup>, Arc<dyn SecretProvider>, SecretStore) {
        (FlightGroup::new(), Arc::new(provider) as Arc<dyn SecretProvider>, SecretStore::new())
    }

    #[tokio::test]
    async fn test_concurrent_fetches_collapse_to_one_call() {
        let provider = Arc::new(StaticProvider::new().with_secret("cold", "value"));
        let group = FlightGroup::new();
        let store = SecretStore::new();
        let dyn_provider: Arc<dyn SecretProvider> = Arc::clone(&provider) as _;

        let fetches = (0..50).map(|_| {
            let group = Arc::clone(&group);
            let dyn_provider = Arc::clone(&dyn_provider);
            let store = store.clone();
            async move { group.fetch("cold", &dyn_provider, &store, Duration::from_secs(60)).await }
        });
        let outcomes = join_all(fetches).await;

        assert_eq!(provider.call_count(), 1);
        for outcome in outcomes {
            assert_eq!(outcome.unwrap().expose(), "value");
        }
    }

    #[tokio::test]
    async fn test_failure_is_shared_by_all_waiters() {
        let provider = Arc::new(StaticProvider::new());
        provider.fail_with("backend down");
        let group = FlightGroup::new();
        let store = SecretStore::new();
        let dyn_provider: Arc<dyn SecretProvider> = Arc::clone(&provider) as _;

        let fetches = (0..10).map(|_| {
            let group = Arc::clone(&group);
            let dyn_provider = Arc::clone(&dyn_provider);
            let store = store.clone();
            async move { group.fetch("cold", &dyn_provider, &store, Duration::from_secs(60)).await }
        });
        let outcomes = join_all(fetches).await;

        assert_eq!(provider.call_count(), 1);
        for outcome in outcomes {
            let err = outcome.unwrap_err();
            assert!(err.to_string().contains("backend down"));
        }
    }

    #[tokio::test]
    async fn test_successful_flight_writes_through_store() {
        let (group, provider, store) = setup(StaticProvider::new().with_secret("k", "v"));

        group.fetch("k", &provider, &store, Duration::from_secs(60)).await.unwrap();

        let entry = store.get("k").await.unwrap();
        assert_eq!(entry.value().expose(), "v");
    }

    #[tokio::test]
    async fn test_sequential_fetches_are_separate_flights() {
        let provider = Arc::new(StaticProvider::new().with_secret("k", "v"));
        let group = FlightGroup::new();
        let store = SecretStore::new();
        let dyn_provider: Arc<dyn SecretProvider> = Arc::clone(&provider) as _;

        group.fetch("k", &dyn_provider, &store, Duration::from_secs(60)).await.unwrap();
        group.fetch("k", &dyn_provider, &store, Duration::from_secs(60)).await.unwrap();

        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_waiter_cancellation_does_not_abort_flight() {
        let provider = Arc::new(StaticProvider::new().with_secret("k", "v"));
        let group = FlightGroup::new();
        let store = SecretStore::new();
        let dyn_provider: Arc<dyn SecretProvider> = Arc::clone(&provider) as _;

        // First waiter starts the flight, then gets dropped immediately.
        {
            let group = Arc::clone(&group);
            let dyn_provider = Arc::clone(&dyn_provider);
            let store = store.clone();
            let waiter = tokio::spawn(async move {
                group.fetch("k", &dyn_provider, &store, Duration::from_secs(60)).await
            });
            waiter.abort();
            let _ = waiter.await;
        }

        // The flight still completes and later fetches observe the result.
        let outcome = group.fetch("k", &dyn_provider, &store, Duration::from_secs(60)).await;
        assert_eq!(outcome.unwrap().expose(), "v");
        assert!(store.get("k").await.is_some());
    }
}
