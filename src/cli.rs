//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{is_valid_time_format, Action};
use clap::Parser;
use std::path::PathBuf;

/// vatrigger - trigger server-side video analytics
///
/// Posts a single form-encoded request to the photo service's video events
/// endpoint and prints two status lines: one when the request is sent and
/// one with the server's answer (or the error).
///
/// Examples:
///   vatrigger
///   vatrigger --server https://photos.example.org
///   vatrigger --action status --format json
///   vatrigger --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the photo service
    ///
    /// Defaults to http://localhost:8080 unless set in .vatrigger.toml.
    #[arg(short, long, value_name = "URL", env = "VATRIGGER_SERVER")]
    pub server: Option<String>,

    /// Endpoint path to post to
    #[arg(long, value_name = "PATH")]
    pub path: Option<String>,

    /// Action to request from the endpoint
    #[arg(short, long, value_name = "ACTION")]
    pub action: Option<Action>,

    /// Request timeout in seconds
    ///
    /// Without it the request waits as long as the connection stays open.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// strftime format of the notification timestamp
    #[arg(long, value_name = "FORMAT")]
    pub time_format: Option<String>,

    /// Output format for notifications (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vatrigger.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .vatrigger.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// How notifications are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `<time>: <text>` lines (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref server) = self.server {
            validate_base_url(server)?;
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref time_format) = self.time_format {
            if !is_valid_time_format(time_format) {
                return Err(format!("Invalid time format: {}", time_format));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Check that a server base URL is an absolute http(s) URL.
pub fn validate_base_url(url: &str) -> Result<(), String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!(
            "Server URL must start with 'http://' or 'https://': {}",
            url
        ));
    }
    Ok(())
}
