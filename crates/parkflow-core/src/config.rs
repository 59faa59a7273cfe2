//! Application configuration management.
//!
//! Settings are stored at `~/.config/parkflow/config.json`. A few of them can
//! be overridden from the environment (or a `.env` file loaded by the CLI):
//!
//! - `PARKFLOW_API_URL`: gateway origin
//! - `PARKFLOW_TOKEN_BACKEND`: `keyring`, `file` or `memory`
//! - `PARKFLOW_STORE_PASSPHRASE`: passphrase for the encrypted token file

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::auth::{EncryptedFileStorage, KeyringStorage, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "parkflow";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "PARKFLOW_API_URL";
pub const ENV_TOKEN_BACKEND: &str = "PARKFLOW_TOKEN_BACKEND";
pub const ENV_STORE_PASSPHRASE: &str = "PARKFLOW_STORE_PASSPHRASE";

/// Where the auth token is kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// OS keychain
    Keyring,
    /// Passphrase-encrypted file in the cache directory
    #[default]
    File,
    /// Nothing persisted; the session ends with the process
    Memory,
}

impl FromStr for TokenBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(TokenBackend::Keyring),
            "file" => Ok(TokenBackend::File),
            "memory" => Ok(TokenBackend::Memory),
            other => anyhow::bail!("Unknown token backend '{}' (expected keyring, file or memory)", other),
        }
    }
}

impl fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenBackend::Keyring => "keyring",
            TokenBackend::File => "file",
            TokenBackend::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub last_email: Option<String>,
    /// Only ever read from the environment, never written to disk
    #[serde(skip)]
    pub store_passphrase: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
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

    /// Apply overrides from `lookup` (the process environment in `load`).
    /// Blank values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = Some(url);
        }
        if let Some(backend) = lookup(ENV_TOKEN_BACKEND) {
            self.token_backend = backend
                .parse()
                .with_context(|| format!("Invalid {}", ENV_TOKEN_BACKEND))?;
        }
        if let Some(passphrase) = lookup(ENV_STORE_PASSPHRASE) {
            self.store_passphrase = Some(passphrase);
        }
        Ok(self)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Token store over the configured backend
    pub fn token_store(&self) -> Result<TokenStore> {
        match self.token_backend {
            TokenBackend::Memory => Ok(TokenStore::in_memory()),
            TokenBackend::Keyring => Ok(TokenStore::new(Arc::new(KeyringStorage::new()))),
            TokenBackend::File => {
                let passphrase = self.store_passphrase.as_deref().ok_or_else(|| {
                    anyhow::anyhow!(
                        "{} must be set to use the encrypted token file (or set {}=keyring)",
                        ENV_STORE_PASSPHRASE,
                        ENV_TOKEN_BACKEND
                    )
                })?;
                let dir = self.cache_dir()?.join("tokens");
                let storage = EncryptedFileStorage::open(&dir, passphrase)
                    .with_context(|| format!("Failed to open token store in {}", dir.display()))?;
                Ok(TokenStore::new(Arc::new(storage)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://localhost:8090");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_backend, TokenBackend::File);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config {
            api_base_url: Some("http://from-file".into()),
            ..Config::default()
        }
        .with_env_overrides(env(&[
            ("PARKFLOW_API_URL", "https://api.parkflow.example"),
            ("PARKFLOW_TOKEN_BACKEND", "Memory"),
            ("PARKFLOW_STORE_PASSPHRASE", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "https://api.parkflow.example");
        assert_eq!(config.token_backend, TokenBackend::Memory);
        assert_eq!(config.store_passphrase.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = Config {
            api_base_url: Some("http://from-file".into()),
            ..Config::default()
        }
        .with_env_overrides(env(&[("PARKFLOW_API_URL", "  ")]))
        .unwrap();

        assert_eq!(config.base_url(), "http://from-file");
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        let result = Config::default().with_env_overrides(env(&[("PARKFLOW_TOKEN_BACKEND", "floppy")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_passphrase_never_serialized() {
        let config = Config {
            store_passphrase: Some("hunter2".into()),
            last_email: Some("driver@example.com".into()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains(r#""token_backend":"file""#));

        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_email.as_deref(), Some("driver@example.com"));
        assert!(back.store_passphrase.is_none());
    }

    #[test]
    fn test_file_backend_requires_passphrase() {
        let err = Config::default().token_store().unwrap_err();
        assert!(err.to_string().contains("PARKFLOW_STORE_PASSPHRASE"));
    }

    #[test]
    fn test_memory_backend() {
        let config = Config {
            token_backend: TokenBackend::Memory,
            ..Config::default()
        };
        let store = config.token_store().unwrap();
        assert!(store.get().is_none());
    }
}
