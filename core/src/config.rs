//! Client configuration.
//!
//! Read from an optional TOML file; `CALENDAR_API_URL` overrides the base
//! URL the same way the bundler variable does for the web client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";
pub const BASE_URL_ENV: &str = "CALENDAR_API_URL";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_error_display_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where the session token is persisted. In-memory when unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    #[serde(default = "default_error_display_secs")]
    pub error_display_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            storage_path: None,
            error_display_secs: default_error_display_secs(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load `path` if it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_toml(&std::fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}
