//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.vatrigger.toml` files.

use crate::models::{Action, DEFAULT_PATH, DEFAULT_TIME_FORMAT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".vatrigger.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Request settings.
    #[serde(default)]
    pub request: RequestConfig,

    /// Notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Where the video events endpoint lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the photo service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// What gets posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Endpoint path, joined onto the base URL.
    #[serde(default = "default_path")]
    pub path: String,

    /// Action to request.
    #[serde(default)]
    pub action: Action,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            action: Action::default(),
        }
    }
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

/// How notifications are stamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// strftime format of the notification timestamp.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
        }
    }
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `.vatrigger.toml` in `dir` is used
    /// when present; a file that exists but can't be parsed is an error.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(config_path) = explicit {
            info!("Loading config from: {}", config_path.display());
            return Self::load(config_path);
        }

        match Self::load_from_dir(dir)? {
            Some(config) => {
                info!("Loaded default config from {}", CONFIG_FILE);
                Ok(config)
            }
            None => {
                debug!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Try to load `.vatrigger.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or via env) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref server) = args.server {
            self.server.base_url = server.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = Some(timeout);
        }
        if let Some(ref path) = args.path {
            self.request.path = path.clone();
        }
        if let Some(action) = args.action {
            self.request.action = action;
        }
        if let Some(ref time_format) = args.time_format {
            self.notify.time_format = time_format.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
