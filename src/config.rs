//! Configuration for embedding applications.
//!
//! The engine itself only needs a [`CachePolicy`]; this module provides the
//! serializable, environment-loadable form of it plus logging settings, so
//! an embedding application can wire the engine from its own config file or
//! from `KEYSTASH_*` environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::error::{Result, SecretsError};
use crate::observability::LogConfig;
use crate::policy::{CachePolicy, FallbackPolicy};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecretsConfig {
    /// Seconds an entry stays fresh after a successful fetch or refresh.
    #[validate(range(min = 1, max = 86_400, message = "TTL must be between 1s and 24h"))]
    pub ttl_secs: u64,

    /// Period of the background refresh task, in seconds.
    #[validate(range(min = 1, max = 86_400, message = "Refresh interval must be between 1s and 24h"))]
    pub refresh_interval_secs: u64,

    /// Serve a stale cached value when a live fetch fails.
    pub stale_if_error: bool,

    /// Logging configuration.
    pub log: LogConfig,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300, // refreshed every 5 minutes, like most token lifetimes allow
            refresh_interval_secs: 300,
            stale_if_error: true,
            log: LogConfig::default(),
        }
    }
}

impl SecretsConfig {
    /// Load configuration from `KEYSTASH_*` environment variables, using
    /// defaults for anything unset.
    ///
    /// - `KEYSTASH_CACHE_TTL_SECS`
    /// - `KEYSTASH_REFRESH_INTERVAL_SECS`
    /// - `KEYSTASH_STALE_IF_ERROR` ("true"/"false")
    /// - `KEYSTASH_LOG_LEVEL`
    /// - `KEYSTASH_LOG_JSON` ("true"/"false")
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("KEYSTASH_CACHE_TTL_SECS") {
            config.ttl_secs = parse_env("KEYSTASH_CACHE_TTL_SECS", &raw)?;
            // Refresh follows the TTL unless set explicitly below.
            config.refresh_interval_secs = config.ttl_secs;
        }
        if let Ok(raw) = std::env::var("KEYSTASH_REFRESH_INTERVAL_SECS") {
            config.refresh_interval_secs = parse_env("KEYSTASH_REFRESH_INTERVAL_SECS", &raw)?;
        }
        if let Ok(raw) = std::env::var("KEYSTASH_STALE_IF_ERROR") {
            config.stale_if_error = parse_env("KEYSTASH_STALE_IF_ERROR", &raw)?;
        }
        if let Ok(level) = std::env::var("KEYSTASH_LOG_LEVEL") {
            config.log.level = level;
        }
        if let Ok(raw) = std::env::var("KEYSTASH_LOG_JSON") {
            config.log.json = parse_env("KEYSTASH_LOG_JSON", &raw)?;
        }

        config.validate_ranges()?;
        Ok(config)
    }

    /// Validate value ranges.
    pub fn validate_ranges(&self) -> Result<()> {
        Validate::validate(self).map_err(|e| SecretsError::config(e.to_string()))
    }

    /// The [`CachePolicy`] this configuration describes.
    pub fn cache_policy(&self) -> Result<CachePolicy> {
        self.validate_ranges()?;

        let fallback =
            if self.stale_if_error { FallbackPolicy::StaleIfError } else { FallbackPolicy::FailFast };

        Ok(CachePolicy::new(Duration::from_secs(self.ttl_secs))
            .with_refresh_interval(Duration::from_secs(self.refresh_interval_secs))
            .with_fallback(fallback))
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| SecretsError::config(format!("Invalid value '{raw}' for {var}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize tests that touch process environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "KEYSTASH_CACHE_TTL_SECS",
            "KEYSTASH_REFRESH_INTERVAL_SECS",
            "KEYSTASH_STALE_IF_ERROR",
            "KEYSTASH_LOG_LEVEL",
            "KEYSTASH_LOG_JSON",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = SecretsConfig::default();
        assert_eq!(config.ttl_secs, 300);
        assert_eq!(config.refresh_interval_secs, 300);
        assert!(config.stale_if_error);
        assert!(config.validate_ranges().is_ok());
    }

    #[test]
    fn test_from_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("KEYSTASH_CACHE_TTL_SECS", "120");
        std::env::set_var("KEYSTASH_STALE_IF_ERROR", "false");
        std::env::set_var("KEYSTASH_LOG_LEVEL", "debug");

        let config = SecretsConfig::from_env().unwrap();
        assert_eq!(config.ttl_secs, 120);
        // Refresh interval follows the TTL when not set explicitly.
        assert_eq!(config.refresh_interval_secs, 120);
        assert!(!config.stale_if_error);
        assert_eq!(config.log.level, "debug");

        clear_env();
    }

    #[test]
    fn test_from_env_explicit_refresh_interval() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("KEYSTASH_CACHE_TTL_SECS", "300");
        std::env::set_var("KEYSTASH_REFRESH_INTERVAL_SECS", "60");

        let config = SecretsConfig::from_env().unwrap();
        assert_eq!(config.ttl_secs, 300);
        assert_eq!(config.refresh_interval_secs, 60);

        clear_env();
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("KEYSTASH_CACHE_TTL_SECS", "not-a-number");
        assert!(SecretsConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_range_validation() {
        let config = SecretsConfig { ttl_secs: 0, ..Default::default() };
        assert!(config.validate_ranges().is_err());
        assert!(config.cache_policy().is_err());

        let config = SecretsConfig { refresh_interval_secs: 1_000_000, ..Default::default() };
        assert!(config.validate_ranges().is_err());
    }

    #[test]
    fn test_cache_policy_conversion() {
        let config = SecretsConfig {
            ttl_secs: 300,
            refresh_interval_secs: 60,
            stale_if_error: false,
            log: LogConfig::default(),
        };

        let policy = config.cache_policy().unwrap();
        assert_eq!(policy.ttl, Duration::from_secs(300));
        assert_eq!(policy.refresh_interval, Duration::from_secs(60));
        assert_eq!(policy.fallback, FallbackPolicy::FailFast);
    }
}
