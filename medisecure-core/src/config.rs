//! Configuration management
//!
//! Config files are stored in platform-appropriate locations:
//! - Linux: ~/.config/medisecure/
//! - macOS: ~/Library/Application Support/medisecure/
//! - Windows: %APPDATA%\medisecure\

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoDirFound,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend service base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Client behavior tuning
    #[serde(default)]
    pub client: ClientConfig,
}

/// Base URLs of the three backend services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Middleware API (registration and authentication)
    #[serde(default = "default_middleware_url")]
    pub middleware_url: String,

    /// Registration center (health-checked only)
    #[serde(default = "default_registration_center_url")]
    pub registration_center_url: String,

    /// Resource server / hospital server (health-checked only)
    #[serde(default = "default_resource_server_url")]
    pub resource_server_url: String,
}

/// Client-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Seconds between recurring health-check passes
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,

    /// Seconds before a notice auto-dismisses
    #[serde(default = "default_notice_dismiss_secs")]
    pub notice_dismiss_secs: u64,

    /// Where credential exports are written; defaults to the current
    /// directory when unset
    pub export_dir: Option<PathBuf>,
}

// Default value functions
fn default_middleware_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_registration_center_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_resource_server_url() -> String {
    "http://127.0.0.1:5001".to_string()
}
fn default_status_poll_secs() -> u64 {
    30
}
fn default_notice_dismiss_secs() -> u64 {
    5
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            middleware_url: default_middleware_url(),
            registration_center_url: default_registration_center_url(),
            resource_server_url: default_resource_server_url(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            status_poll_secs: default_status_poll_secs(),
            notice_dismiss_secs: default_notice_dismiss_secs(),
            export_dir: None,
        }
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("medisecure"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
