//! Configuration for the Azure storage provider
//!
//! Configuration is deserialized from whatever the host passes in, or loaded
//! from layered sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `AZURE_STORAGE_` prefix)
//! 2. `./azure-storage.toml`
//! 3. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # azure-storage.toml
//! account = "myaccount"
//! account_key = "base64key=="
//! container_name = "uploads"
//! private_container_name = "uploads-private"
//! default_path = "files"
//! cdn_name = "https://cdn.example.com"
//! max_width = 48
//! max_concurrent = 20
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::types::{StorageError, StorageResult};

/// Default thumbnail target width in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 48;

/// Default bound on concurrent block uploads per transfer
pub const DEFAULT_MAX_CONCURRENT: usize = 20;

/// Provider configuration
///
/// `account` and `account_key` authenticate against the storage service;
/// the account name also fixes the service root
/// `https://{account}.blob.core.windows.net` that every produced URL starts
/// from (unless rewritten to `cdn_name`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureStorageConfig {
    /// Storage account name
    pub account: String,

    /// Shared key for the storage account
    pub account_key: String,

    /// Container for public files
    pub container_name: String,

    /// Container for files flagged private
    pub private_container_name: String,

    /// Sub-path used when a record specifies none (empty = unset)
    pub default_path: Option<String>,

    /// CDN host substituted for the service root in produced URLs
    /// (empty = unset)
    pub cdn_name: Option<String>,

    /// Thumbnail target width in pixels
    pub max_width: u32,

    /// Bound on concurrent block uploads per transfer
    pub max_concurrent: usize,
}

impl Default for AzureStorageConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            account_key: String::new(),
            container_name: String::new(),
            private_container_name: String::new(),
            default_path: None,
            cdn_name: None,
            max_width: DEFAULT_MAX_WIDTH,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl AzureStorageConfig {
    /// Loads configuration from `azure-storage.toml` merged with
    /// `AZURE_STORAGE_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if a source fails to parse or the
    /// merged result fails validation.
    pub fn load() -> StorageResult<Self> {
        let config: Self = Figment::new()
            .merge(Toml::file("azure-storage.toml"))
            .merge(Env::prefixed("AZURE_STORAGE_"))
            .extract()
            .map_err(|e| StorageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates required fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the account, key, or either
    /// container name is empty.
    pub fn validate(&self) -> StorageResult<()> {
        if self.account.is_empty() {
            return Err(StorageError::Config("account must not be empty".into()));
        }
        if self.account_key.is_empty() {
            return Err(StorageError::Config("account_key must not be empty".into()));
        }
        if self.container_name.is_empty() {
            return Err(StorageError::Config(
                "container_name must not be empty".into(),
            ));
        }
        if self.private_container_name.is_empty() {
            return Err(StorageError::Config(
                "private_container_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
