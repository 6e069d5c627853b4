//! Configuration management for Hearth
//!
//! Loaded from `hearth.toml`. Every section has defaults, so a missing file
//! or a partial file is valid. The API secret itself is never written to the
//! file; only the name of the environment variable holding it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default file name looked up in the working directory.
pub const CONFIG_FILE: &str = "hearth.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub list: ListConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:3000`
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path of the database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

/// Shared-secret settings for the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the shared secret
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

/// Real-time channel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Channel every client of this household subscribes to
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Events buffered per channel before slow subscribers start lagging
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

/// Client list behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Tasks per fetched page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Below this many visible tasks a removal triggers a refetch
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Scroll percentage past which the next page is requested
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f64,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from(".hearth/hearth.db")
}

fn default_secret_env() -> String {
    "HEARTH_API_SECRET".to_string()
}

fn default_channel() -> String {
    "user-household".to_string()
}

fn default_buffer() -> usize {
    256
}

fn default_page_size() -> usize {
    8
}

fn default_low_water_mark() -> usize {
    5
}

fn default_scroll_threshold() -> f64 {
    85.0
}

impl HearthConfig {
    /// Load configuration from `path` or use defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read the shared secret from the configured environment variable
    pub fn api_secret(&self) -> Result<String> {
        match std::env::var(&self.auth.secret_env) {
            Ok(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(Error::Config(format!(
                "environment variable {} is not set",
                self.auth.secret_env
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.list.page_size == 0 {
            return Err(Error::Config("list.page_size must be positive".to_string()));
        }
        if !(0.0..=100.0).contains(&self.list.scroll_threshold) {
            return Err(Error::Config(format!(
                "list.scroll_threshold must be a percentage (got {})",
                self.list.scroll_threshold
            )));
        }
        if self.realtime.buffer == 0 {
            return Err(Error::Config("realtime.buffer must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            database_path: default_database_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            buffer: default_buffer(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            low_water_mark: default_low_water_mark(),
            scroll_threshold: default_scroll_threshold(),
        }
    }
}
