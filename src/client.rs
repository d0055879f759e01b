//! Secrets client facade.
//!
//! Composes a provider, the TTL store, the single-flight group, and the
//! background refresh scheduler behind one `get` operation. Built via
//! [`SecretsClient::builder`], which fails fast on missing collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use keystash::{CachePolicy, SecretsClient};
//! use keystash::provider::VaultProvider;
//! use std::time::Duration;
//!
//! let vault = VaultProvider::from_env().await?;
//! let client = SecretsClient::builder()
//!     .with_provider(vault)
//!     .with_ttl(Duration::from_secs(300))
//!     .build()?;
//!
//! let password = client.get("db.password").await?;
//! // ... on the way out:
//! client.shutdown().await;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, SecretsError};
use crate::flight::FlightGroup;
use crate::observability::MetricsRecorder;
use crate::policy::CachePolicy;
use crate::provider::{ProviderKind, SecretProvider};
use crate::scheduler::{RefreshScheduler, SchedulerHandle};
use crate::store::SecretStore;
use crate::types::SecretValue;

/// Facade over provider, store, scheduler, and fallback policy.
///
/// Cheap to share behind an `Arc`; all operations take `&self`. The client
/// exclusively owns its store and scheduler; the provider is injected and
/// may be shared with other clients.
pub struct SecretsClient {
    provider: Arc<dyn SecretProvider>,
    store: SecretStore,
    flights: Arc<FlightGroup>,
    policy: CachePolicy,
    scheduler: Mutex<Option<SchedulerHandle>>,
    shut_down: AtomicBool,
    metrics: MetricsRecorder,
}

impl fmt::Debug for SecretsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsClient")
            .field("provider", &self.provider.kind())
            .field("policy", &self.policy)
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish()
    }
}

impl SecretsClient {
    /// Start building a client.
    pub fn builder() -> SecretsClientBuilder {
        SecretsClientBuilder::default()
    }

    /// Get a secret value.
    ///
    /// Served from the cache while fresh. On a miss or expired entry, a
    /// single-flight fetch goes to the provider: concurrent callers for the
    /// same key share one backend call and its outcome. A failed fetch falls
    /// back to the stale cached value when the policy allows; otherwise it
    /// surfaces as [`SecretsError::FetchFailed`].
    pub async fn get(&self, key: &str) -> Result<SecretValue> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(SecretsError::ShutDown);
        }

        if let Some(entry) = self.store.get(key).await {
            if !entry.is_expired(Instant::now()) {
                debug!(key = %key, "Cache hit");
                self.metrics.record_cache_hit(key);
                return Ok(entry.value().clone());
            }
            debug!(key = %key, "Cached secret expired");
        }

        self.metrics.record_cache_miss(key);
        match self.flights.fetch(key, &self.provider, &self.store, self.policy.ttl).await {
            Ok(value) => {
                self.metrics.record_fetch(key, true);
                Ok(value)
            }
            Err(cause) => {
                self.metrics.record_fetch(key, false);

                // Re-read rather than reuse the earlier lookup: a background
                // refresh may have landed while the flight was failing.
                let entry = self.store.get(key).await;
                if let Some(ref entry) = entry {
                    if !entry.is_expired(Instant::now()) {
                        self.metrics.record_cache_hit(key);
                        return Ok(entry.value().clone());
                    }
                }

                let resolved = self.policy.fallback.resolve(key, entry.as_ref(), cause);
                if resolved.is_ok() {
                    self.metrics.record_stale_serve(key);
                }
                resolved
            }
        }
    }

    /// Get a secret value, giving up after `limit`.
    ///
    /// The timeout is caller-scoped: exceeding it fails this call with
    /// [`SecretsError::FetchFailed`] but does not cancel the underlying
    /// provider call, and other waiters of the same single-flight group are
    /// unaffected.
    pub async fn get_with_timeout(&self, key: &str, limit: Duration) -> Result<SecretValue> {
        match tokio::time::timeout(limit, self.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(SecretsError::fetch_failed(
                key,
                SecretsError::provider(key, format!("timed out after {}ms", limit.as_millis())),
            )),
        }
    }

    /// Shut the client down.
    ///
    /// Stops the refresh scheduler (a tick already running completes) and
    /// rejects subsequent `get` calls with [`SecretsError::ShutDown`].
    /// Idempotent: calling twice is a no-op.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.scheduler.lock().await.take() {
            handle.shutdown();
            handle.join().await;
        }
        info!("Secrets client shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// The backend variant this client fetches from.
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    /// Number of cached entries, fresh or stale.
    pub async fn cache_size(&self) -> usize {
        self.store.len().await
    }

    /// Drop the cached entry for a key. The next `get` fetches live.
    pub async fn invalidate(&self, key: &str) {
        self.store.invalidate(key).await;
    }

    /// Drop all cached entries.
    pub async fn clear_cache(&self) {
        self.store.clear().await;
    }
}

/// Builder for [`SecretsClient`].
///
/// A provider and a cache policy (at minimum a TTL) are required;
/// [`build`](Self::build) fails with [`SecretsError::Config`] otherwise.
#[derive(Default)]
pub struct SecretsClientBuilder {
    provider: Option<Arc<dyn SecretProvider>>,
    policy: Option<CachePolicy>,
}

impl SecretsClientBuilder {
    /// Set the secret backend.
    pub fn with_provider(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set a backend that is shared with other owners.
    pub fn with_shared_provider(mut self, provider: Arc<dyn SecretProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the full cache policy.
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Shorthand for a default policy with the given TTL.
    pub fn with_ttl(self, ttl: Duration) -> Self {
        self.with_cache_policy(CachePolicy::new(ttl))
    }

    /// Build the client and start its refresh scheduler.
    pub fn build(self) -> Result<SecretsClient> {
        let provider =
            self.provider.ok_or_else(|| SecretsError::config("no secret provider configured"))?;
        let policy =
            self.policy.ok_or_else(|| SecretsError::config("no cache policy configured"))?;
        policy.validate()?;

        let store = SecretStore::new();
        let scheduler = RefreshScheduler::new(
            Arc::clone(&provider),
            store.clone(),
            policy.ttl,
            policy.refresh_interval,
        )
        .spawn();

        info!(
            provider = %provider.kind(),
            ttl_secs = policy.ttl.as_secs(),
            refresh_secs = policy.refresh_interval.as_secs(),
            "Secrets client started"
        );

        Ok(SecretsClient {
            provider,
            store,
            flights: FlightGroup::new(),
            policy,
            scheduler: Mutex::new(Some(scheduler)),
            shut_down: AtomicBool::new(false),
            metrics: MetricsRecorder::new(),
        })
    }
}
