//! Environment variable secret backend.
//!
//! Reads secrets from environment variables with the `KEYSTASH_SECRET_`
//! prefix. Intended for development and testing only: environment variables
//! are visible in process listings, are not encrypted, and cannot rotate.
//! Use the Vault backend for production.
//!
//! ```bash
//! export KEYSTASH_SECRET_DB_PASSWORD="s3cr3t"
//! ```
//!
//! A `get("db_password")` then resolves via `KEYSTASH_SECRET_DB_PASSWORD`.

use async_trait::async_trait;
use std::env;

use super::{ProviderKind, SecretProvider};
use crate::error::{Result, SecretsError};
use crate::types::SecretValue;

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "KEYSTASH_SECRET_";

/// Environment variable secret backend (development only).
#[derive(Debug, Clone, Default)]
pub struct EnvProvider;

impl EnvProvider {
    /// Create a new environment variable provider.
    pub fn new() -> Self {
        Self
    }

    /// Map a secret key to its environment variable name.
    fn key_to_env_var(key: &str) -> String {
        format!("{}{}", SECRET_PREFIX, key.to_uppercase().replace(['.', '-'], "_"))
    }
}

#[async_trait]
impl SecretProvider for EnvProvider {
    async fn retrieve(&self, key: &str) -> Result<SecretValue> {
        let env_var = Self::key_to_env_var(key);

        env::var(&env_var).map(SecretValue::new).map_err(|_| {
            SecretsError::provider(key, format!("not found in environment (looked for {env_var})"))
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Env
    }
}
