//! Pluggable secret backends.
//!
//! A [`SecretProvider`] is the engine's only view of the outside world: a
//! single `retrieve` capability over an opaque backend. Providers are
//! stateless and idempotent from the cache's perspective; the engine may call
//! `retrieve` for the same key repeatedly (foreground fetches and background
//! refreshes) without coordination.
//!
//! The set of backends is closed and enumerated by [`ProviderKind`]. Adding
//! a backend means adding a variant, not subclassing an open hierarchy.

pub mod env;
pub mod memory;
pub mod vault;

pub use env::EnvProvider;
pub use memory::StaticProvider;
pub use vault::{VaultProvider, VaultSettings};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::types::SecretValue;

/// The closed set of secret backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// HashiCorp Vault KV v2
    Vault,
    /// Environment variables (development only)
    Env,
    /// In-memory map (tests and embedding defaults)
    Static,
}

impl ProviderKind {
    /// Stable string form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vault => "vault",
            Self::Env => "env",
            Self::Static => "static",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vault" => Ok(Self::Vault),
            "env" => Ok(Self::Env),
            "static" => Ok(Self::Static),
            _ => Err(format!("Unknown provider kind: {}", s)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for secret backends.
///
/// Implementations must be `Send + Sync` for use across async tasks.
///
/// # Failure semantics
///
/// Every failure is reported as [`SecretsError::Provider`] carrying the key
/// and an underlying message. "Value does not exist" and "backend
/// unreachable" are deliberately the same variant: the policy layer treats
/// them identically (serve stale or propagate).
///
/// [`SecretsError::Provider`]: crate::error::SecretsError::Provider
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Retrieve the current value for a key from the backend.
    async fn retrieve(&self, key: &str) -> Result<SecretValue>;

    /// The backend variant this provider implements.
    fn kind(&self) -> ProviderKind;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
