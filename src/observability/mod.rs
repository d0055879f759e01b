//! Observability for the secret engine: structured logging and metrics.
//!
//! Logging goes through the `tracing` ecosystem; metrics go through the
//! `metrics` facade. Installing a metrics exporter (Prometheus or otherwise)
//! is the embedding application's concern — this crate only records.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig};
pub use metrics::MetricsRecorder;
