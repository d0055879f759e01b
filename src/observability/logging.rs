//! Structured logging setup.
//!
//! Secret values never reach a log line: every value on the fetch path is a
//! [`SecretValue`](crate::types::SecretValue), whose Display and Debug forms
//! are redacted. Log statements carry keys, outcomes, and timings only.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, SecretsError};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log filter, overridable via `RUST_LOG`
    /// (e.g. "info", "keystash=debug").
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set; otherwise uses `config.level`. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            SecretsError::config(format!("Invalid log filter '{}': {}", config.level, e))
        })?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.map_err(|e| SecretsError::config(format!("Failed to install subscriber: {}", e)))
}
