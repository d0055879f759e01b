//! Error types for the secret caching engine.

use thiserror::Error;

/// Result type for secret engine operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while fetching, caching, or refreshing secrets.
///
/// Callers of [`SecretsClient::get`](crate::client::SecretsClient::get) only
/// ever observe [`FetchFailed`](SecretsError::FetchFailed),
/// [`Config`](SecretsError::Config), or [`ShutDown`](SecretsError::ShutDown).
/// [`Provider`](SecretsError::Provider) is the internal cause wrapped inside
/// a fetch failure; background refresh failures are logged and never surface.
///
/// `Clone` because a single fetch outcome is shared verbatim with every
/// waiter of a single-flight group.
#[derive(Error, Debug, Clone)]
pub enum SecretsError {
    /// The backend call did not return a value (unreachable, denied, or not
    /// found). A missing secret and an unreachable backend are the same
    /// failure here, distinguished only by the message.
    #[error("Provider failed for secret '{key}': {message}")]
    Provider { key: String, message: String },

    /// Surfaced to a caller of `get` when both the live fetch and the
    /// stale-fallback option are unavailable.
    #[error("Failed to fetch secret '{key}'")]
    FetchFailed {
        key: String,
        #[source]
        source: Box<SecretsError>,
    },

    /// Builder or configuration invoked without required collaborators or
    /// with invalid values. Fails at construction, never at call time.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Operation attempted after `shutdown()`.
    #[error("Secrets client is shut down")]
    ShutDown,
}

impl SecretsError {
    /// Create a provider failure.
    pub fn provider(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { key: key.into(), message: message.into() }
    }

    /// Create a fetch failure wrapping its underlying cause.
    pub fn fetch_failed(key: impl Into<String>, source: SecretsError) -> Self {
        Self::FetchFailed { key: key.into(), source: Box::new(source) }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Whether this error originated in the provider layer.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
