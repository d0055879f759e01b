//! Metrics for cache and refresh activity.
//!
//! Recorded through the `metrics` facade; whatever exporter the embedding
//! application installs receives them. Counter names are stable and
//! label-differentiated by outcome.

use metrics::counter;

/// Records cache and provider activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance.
    pub fn new() -> Self {
        Self
    }

    /// Record a `get` served from a fresh cache entry.
    pub fn record_cache_hit(&self, key: &str) {
        counter!("secret_cache_hits_total").increment(1);
        let labels = [("key", key.to_string())];
        counter!("secret_cache_hits_total", &labels).increment(1);
    }

    /// Record a `get` that had to go to the provider (cold or expired).
    pub fn record_cache_miss(&self, key: &str) {
        counter!("secret_cache_misses_total").increment(1);
        let labels = [("key", key.to_string())];
        counter!("secret_cache_misses_total", &labels).increment(1);
    }

    /// Record the outcome of a foreground provider fetch.
    pub fn record_fetch(&self, key: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("key", key.to_string()), ("status", status.to_string())];
        counter!("secret_fetches_total", &labels).increment(1);
    }

    /// Record the outcome of one key's background refresh.
    pub fn record_refresh(&self, key: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("key", key.to_string()), ("status", status.to_string())];
        counter!("secret_refreshes_total", &labels).increment(1);
    }

    /// Record a stale value served because the live fetch failed.
    pub fn record_stale_serve(&self, key: &str) {
        counter!("secret_stale_serves_total").increment(1);
        let labels = [("key", key.to_string())];
        counter!("secret_stale_serves_total", &labels).increment(1);
    }
}
