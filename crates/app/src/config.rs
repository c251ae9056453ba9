//! Client configuration.
//!
//! Precedence:
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Defaults

use std::path::PathBuf;

use beetime_infrastructure::FileStorage;

/// Backend base address.
pub const BACKEND_URL_VAR: &str = "BEETIME_BACKEND_URL";
/// Redirect URI handed to the identity platform.
pub const APP_URL_VAR: &str = "BEETIME_APP_URL";
/// Location of the client storage file.
pub const STORAGE_PATH_VAR: &str = "BEETIME_STORAGE_PATH";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8085";
const DEFAULT_APP_URL: &str = "http://localhost:9000";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No storage path was given and the platform has no config directory.
    #[error("no storage path: set {STORAGE_PATH_VAR} or pass --storage")]
    NoStoragePath,
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base address, without the `/api/v1` prefix.
    pub backend_url: String,
    /// Application URL, used as the identity redirect URI.
    pub app_url: String,
    /// Client storage file.
    pub storage_path: PathBuf,
}

impl ClientConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());

        let storage_path = var(STORAGE_PATH_VAR)
            .map(PathBuf::from)
            .or_else(FileStorage::default_path)
            .ok_or(ConfigError::NoStoragePath)?;

        Ok(Self {
            backend_url: var(BACKEND_URL_VAR).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            app_url: var(APP_URL_VAR).unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            storage_path,
        })
    }

    /// Applies command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, backend_url: Option<String>, storage: Option<PathBuf>) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = url;
        }
        if let Some(path) = storage {
            self.storage_path = path;
        }
        self
    }
}
