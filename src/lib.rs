//! # Keystash
//!
//! Keystash is an embedded secret-caching and refresh engine. It fetches
//! sensitive values from a pluggable backend, caches them for a bounded
//! lifetime, refreshes them in the background, and falls back to a stale
//! value when a refresh fails.
//!
//! ## Architecture
//!
//! ```text
//! get(key) → SecretStore (TTL) → single-flight fetch → SecretProvider
//!                 ↑                                        ↓
//!          RefreshScheduler  ←———— periodic tick ————  FallbackPolicy
//! ```
//!
//! ## Core Components
//!
//! - **[`SecretsClient`]**: the facade — `get`, `shutdown`, built via
//!   [`SecretsClient::builder`]
//! - **[`SecretStore`]**: concurrent TTL-bound cache with atomic replace
//! - **[`SecretProvider`](provider::SecretProvider)**: backend abstraction
//!   (Vault, environment variables, in-memory)
//! - **[`RefreshScheduler`](scheduler::RefreshScheduler)**: periodic
//!   background refresh of every resident key
//! - **[`CachePolicy`]/[`FallbackPolicy`]**: freshness and stale-serve rules
//!
//! ## Example
//!
//! ```rust
//! use keystash::{provider::StaticProvider, SecretsClient};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> keystash::Result<()> {
//! let provider = StaticProvider::new().with_secret("db.password", "s3cr3t");
//! let client = SecretsClient::builder()
//!     .with_provider(provider)
//!     .with_ttl(Duration::from_secs(300))
//!     .build()?;
//!
//! let password = client.get("db.password").await?;
//! assert_eq!(password.expose(), "s3cr3t");
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod policy;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod types;

mod flight;

// Re-export commonly used types
pub use client::{SecretsClient, SecretsClientBuilder};
pub use config::SecretsConfig;
pub use error::{Result, SecretsError};
pub use observability::{init_logging, LogConfig, MetricsRecorder};
pub use policy::{CachePolicy, FallbackPolicy};
pub use provider::{ProviderKind, SecretProvider};
pub use store::{CachedSecret, SecretStore};
pub use types::SecretValue;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
