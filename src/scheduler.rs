//! Background refresh of cached secrets.
//!
//! A dedicated task revisits every key resident in the store on a fixed
//! period and re-invokes the provider for each. Refresh outcomes only ever
//! touch the store: success replaces the entry with a full TTL, failure
//! leaves the stale entry in place. Nothing here surfaces to callers.
//!
//! The first refresh runs one full period after start, not immediately — a
//! freshly built client has just fetched whatever it holds.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::observability::MetricsRecorder;
use crate::provider::SecretProvider;
use crate::store::SecretStore;

/// Periodic refresh task over a store and provider.
pub struct RefreshScheduler {
    provider: Arc<dyn SecretProvider>,
    store: SecretStore,
    ttl: Duration,
    period: Duration,
    metrics: MetricsRecorder,
}

/// Handle for the running refresh task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](SchedulerHandle::shutdown) and then
/// [`join`](SchedulerHandle::join) for an orderly stop. A tick that is
/// already running completes; no further tick is scheduled afterwards.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the refresh task to stop after any tick currently running.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the refresh task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

impl RefreshScheduler {
    /// Create a scheduler over the given store and provider.
    ///
    /// `ttl` is the freshness granted by each successful refresh; `period`
    /// is the tick interval.
    pub fn new(
        provider: Arc<dyn SecretProvider>,
        store: SecretStore,
        ttl: Duration,
        period: Duration,
    ) -> Self {
        Self { provider, store, ttl, period, metrics: MetricsRecorder::new() }
    }

    /// Start the refresh task.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(period_secs = self.period.as_secs(), "Secret refresh scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.run_tick().await,
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Secret refresh scheduler stopped");
                            break;
                        }
                    }
                }
            }
        });

        SchedulerHandle { shutdown_tx, task }
    }

    /// Refresh every key in a point-in-time snapshot of the store.
    ///
    /// Keys are independent: one failure is logged and counted, then the
    /// tick moves on to the next key. Keys added after the snapshot are
    /// picked up on the next tick.
    async fn run_tick(&self) {
        let keys = self.store.keys_snapshot().await;
        if keys.is_empty() {
            return;
        }

        debug!(count = keys.len(), "Refreshing cached secrets");
        let mut failed = 0usize;

        for key in &keys {
            match self.provider.retrieve(key).await {
                Ok(value) => {
                    // Full TTL renewal, regardless of remaining freshness.
                    self.store.put(key, value, self.ttl).await;
                    self.metrics.record_refresh(key, true);
                    debug!(key = %key, "Refreshed secret");
                }
                Err(e) => {
                    failed += 1;
                    self.metrics.record_refresh(key, false);
                    warn!(key = %key, error = %e, "Refresh failed, keeping existing entry");
                }
            }
        }

        if failed > 0 {
            warn!(failed, total = keys.len(), "Refresh tick completed with failures");
        } else {
            debug!(total = keys.len(), "Refresh tick completed");
        }
    }
}
