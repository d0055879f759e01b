//! HashiCorp Vault secret backend.
//!
//! Reads secrets from Vault's KV v2 engine. Each secret is stored at
//! `{mount_path}/{key}` with the value under a `value` field, the
//! convention used for all secrets this engine manages.
//!
//! # Configuration
//!
//! - Vault server address (HTTPS recommended)
//! - Authentication token
//! - Optional namespace for Enterprise multi-tenancy
//! - KV v2 mount path (default: "secret")
//!
//! # Example
//!
//! ```rust,ignore
//! use keystash::provider::{VaultProvider, VaultSettings};
//!
//! let settings = VaultSettings {
//!     address: "https://vault.example.com:8200".to_string(),
//!     token: Some("vault-token".to_string()),
//!     namespace: None,
//!     mount_path: "secret".to_string(),
//! };
//! let provider = VaultProvider::connect(settings).await?;
//! let value = provider.retrieve("db.password").await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::kv2;

use super::{ProviderKind, SecretProvider};
use crate::error::{Result, SecretsError};
use crate::types::SecretValue;

/// Configuration for the Vault backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Vault server address (e.g. "https://vault.example.com:8200")
    pub address: String,

    /// Authentication token (if using token auth)
    pub token: Option<String>,

    /// Vault namespace (Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: default_mount_path(),
        }
    }
}

/// Vault KV v2 secret backend.
///
/// `Send + Sync`; safe to share across async tasks behind an `Arc`.
pub struct VaultProvider {
    client: VaultClient,
    mount_path: String,
}

impl std::fmt::Debug for VaultProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultProvider")
            .field("mount_path", &self.mount_path)
            .finish_non_exhaustive()
    }
}

impl VaultProvider {
    /// Connect to Vault with the given settings.
    ///
    /// Verifies reachability with a health check before returning, so a
    /// misconfigured address fails at construction rather than on the first
    /// fetch.
    pub async fn connect(settings: VaultSettings) -> Result<Self> {
        if settings.address.is_empty() {
            return Err(SecretsError::config("Vault address cannot be empty"));
        }

        let mut builder = VaultClientSettingsBuilder::default();
        builder.address(&settings.address);

        if let Some(ref token) = settings.token {
            builder.token(token);
        }
        if let Some(namespace) = settings.namespace.clone() {
            builder.namespace(Some(namespace));
        }

        let client_settings = builder
            .build()
            .map_err(|e| SecretsError::config(format!("Invalid Vault settings: {}", e)))?;

        let client = VaultClient::new(client_settings)
            .map_err(|e| SecretsError::config(format!("Failed to create Vault client: {}", e)))?;

        match vaultrs::sys::health(&client).await {
            Ok(_) => {
                tracing::info!(address = %settings.address, "Connected to Vault");
            }
            Err(e) => {
                tracing::error!(error = %e, address = %settings.address, "Vault health check failed");
                return Err(SecretsError::config(format!("Vault health check failed: {}", e)));
            }
        }

        Ok(Self { client, mount_path: settings.mount_path })
    }

    /// Connect using standard Vault environment variables.
    ///
    /// - `VAULT_ADDR`: server address (required)
    /// - `VAULT_TOKEN`: authentication token
    /// - `VAULT_NAMESPACE`: optional namespace
    /// - `VAULT_MOUNT_PATH`: KV v2 mount path (default: "secret")
    pub async fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| SecretsError::config("VAULT_ADDR environment variable not set"))?;

        let settings = VaultSettings {
            address,
            token: std::env::var("VAULT_TOKEN").ok(),
            namespace: std::env::var("VAULT_NAMESPACE").ok(),
            mount_path: std::env::var("VAULT_MOUNT_PATH")
                .unwrap_or_else(|_| default_mount_path()),
        };

        Self::connect(settings).await
    }
}

#[async_trait]
impl SecretProvider for VaultProvider {
    async fn retrieve(&self, key: &str) -> Result<SecretValue> {
        // Latest version of the secret from KV v2.
        let data: HashMap<String, String> =
            kv2::read(&self.client, &self.mount_path, key).await.map_err(|e| {
                tracing::debug!(error = %e, key = %key, "Vault read failed");
                SecretsError::provider(key, format!("Vault read failed: {}", e))
            })?;

        data.get("value")
            .map(|v| SecretValue::new(v.clone()))
            .ok_or_else(|| SecretsError::provider(key, "secret has no 'value' field"))
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Vault
    }

    async fn health_check(&self) -> Result<()> {
        vaultrs::sys::health(&self.client)
            .await
            .map(|_| ())
            .map_err(|e| SecretsError::provider("(health)", format!("Vault unhealthy: {}", e)))
    }
}
