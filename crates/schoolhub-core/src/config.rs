//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API endpoint and timeout, which storage backend holds credentials,
//! the presence policy, and the last used username.
//!
//! Configuration is stored at `~/.config/schoolhub/config.json`. A few
//! settings can be overridden from the environment (`SCHOOLHUB_API_URL`,
//! `SCHOOLHUB_TIMEOUT_SECS`, `SCHOOLHUB_STORAGE`).

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::PresencePolicy;
use crate::auth::CredentialStore;
use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "schoolhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.schoolhub.app/";

/// Per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const ENV_API_URL: &str = "SCHOOLHUB_API_URL";
const ENV_TIMEOUT_SECS: &str = "SCHOOLHUB_TIMEOUT_SECS";
const ENV_STORAGE: &str = "SCHOOLHUB_STORAGE";

/// Where the session token and profile are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
    /// Overrides the directory the file backend writes to
    pub data_dir: Option<PathBuf>,
    pub presence: PresencePolicy,
    /// Also drop the cached profile on logout. Off by default: the profile
    /// stays on disk for the next sign-in.
    pub forget_profile_on_logout: bool,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage: StorageBackend::default(),
            data_dir: None,
            presence: PresencePolicy::default(),
            forget_profile_on_logout: false,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the config file (defaults when missing), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_json(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a config file body. Values the client cannot run with are
    /// logged and reset to their defaults.
    pub fn from_json(contents: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        config.sanitize();
        Ok(config)
    }

    fn sanitize(&mut self) {
        if self.request_timeout_secs == 0 {
            warn!(
                "Ignoring request_timeout_secs = 0, using {}",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup. Invalid values are logged
    /// and skipped so a typo in the environment never blocks startup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }

        if let Some(raw) = lookup(ENV_STORAGE) {
            match raw.parse::<StorageBackend>() {
                Ok(backend) => self.storage = backend,
                Err(e) => warn!(error = %e, "Ignoring invalid {}", ENV_STORAGE),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the credential store for the configured backend
    pub fn credential_store(&self) -> Result<CredentialStore> {
        let backend: Arc<dyn KeyValueStore> = match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStore::new()),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(CredentialStore::new(backend))
    }
}
