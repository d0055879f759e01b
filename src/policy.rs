//! Cache policy and fetch-failure fallback.
//!
//! The policy layer owns two decisions: how long a cached secret stays fresh
//! (and how often the background refresh runs), and what happens when a live
//! fetch fails for a key that still has a stale entry — serve it, or
//! propagate the failure.

use std::time::Duration;
use tracing::warn;

use crate::error::{Result, SecretsError};
use crate::store::CachedSecret;
use crate::types::SecretValue;

/// What to do when a live fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Serve a stale cached value if one exists, propagate otherwise.
    ///
    /// Graceful degradation: a backend outage does not take down callers
    /// whose secrets were fetched at least once.
    #[default]
    StaleIfError,

    /// Always propagate the failure, even when a stale value exists.
    FailFast,
}

impl FallbackPolicy {
    /// Decide the outcome of a failed fetch.
    ///
    /// `stale` is the expired-but-present store entry for the key, if any.
    /// Serving it records a soft warning; it never silently masks that the
    /// backend failed.
    pub fn resolve(
        &self,
        key: &str,
        stale: Option<&CachedSecret>,
        cause: SecretsError,
    ) -> Result<SecretValue> {
        match (self, stale) {
            (Self::StaleIfError, Some(entry)) => {
                warn!(
                    key = %key,
                    error = %cause,
                    age_secs = entry.created_at().elapsed().as_secs(),
                    "Fetch failed, serving stale cached secret"
                );
                Ok(entry.value().clone())
            }
            _ => Err(SecretsError::fetch_failed(key, cause)),
        }
    }
}

/// TTL and refresh configuration for the secret cache.
///
/// # Example
///
/// ```rust
/// use keystash::CachePolicy;
/// use std::time::Duration;
///
/// // 5-minute freshness, refreshed in the background every 5 minutes.
/// let policy = CachePolicy::new(Duration::from_secs(300));
///
/// // Refresh more eagerly than the TTL so entries rarely expire.
/// let eager = CachePolicy::new(Duration::from_secs(300))
///     .with_refresh_interval(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an entry remains fresh after a successful fetch or refresh.
    pub ttl: Duration,

    /// Period of the background refresh task. The first refresh runs one
    /// full interval after the client starts.
    pub refresh_interval: Duration,

    /// What to do when a live fetch fails.
    pub fallback: FallbackPolicy,
}

impl CachePolicy {
    /// Policy with the given TTL, background refresh at the same period,
    /// and stale-serve fallback.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, refresh_interval: ttl, fallback: FallbackPolicy::default() }
    }

    /// Override the background refresh period.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Override the fetch-failure fallback.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Validate the policy. Zero durations are rejected: a zero TTL would
    /// violate the store's `expires_at > created_at` invariant and a zero
    /// interval would spin the refresh task.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(SecretsError::config("cache TTL must be greater than zero"));
        }
        if self.refresh_interval.is_zero() {
            return Err(SecretsError::config("refresh interval must be greater than zero"));
        }
        Ok(())
    }
}
