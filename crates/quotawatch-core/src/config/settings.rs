use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::duration::{format_duration, parse_duration};
use crate::refresh::ControllerConfig;
use crate::usage::{ClientConfig, DEFAULT_BETA_HEADER, DEFAULT_ENDPOINT};

/// Smallest accepted refresh interval
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(200);

/// Environment variable overriding the protocol header value
pub const ENV_BETA_HEADER: &str = "ANTHROPIC_BETA_HEADER";
/// Environment variable overriding the HTTP timeout (duration string)
pub const ENV_HTTP_TIMEOUT: &str = "ANTHROPIC_HTTP_TIMEOUT";

/// Invalid startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid duration {value:?} (expected e.g. 30s, 750ms, 1m30s)")]
    InvalidDuration { value: String },

    #[error("refresh interval too small; must be at least 200ms")]
    IntervalTooSmall,

    #[error("http client timeout must be positive")]
    NonPositiveTimeout,

    #[error("beta header must not be empty")]
    EmptyBetaHeader,

    #[error("endpoint must not be empty")]
    EmptyEndpoint,
}

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Terminal dashboard for OAuth usage quotas")]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Refresh interval (e.g. 30s, 1m)
    #[arg(short = 'i', long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Path to the OAuth credentials file
    #[arg(long)]
    pub creds: Option<PathBuf>,

    /// HTTP client timeout (e.g. 8s)
    #[arg(long, value_parser = parse_duration)]
    pub http_timeout: Option<Duration>,

    /// Value for the anthropic-beta header
    #[arg(long)]
    pub beta_header: Option<String>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Use the high-contrast palette
    #[arg(long)]
    pub high_contrast: bool,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Refresh interval in milliseconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,

    /// Whole-request HTTP timeout in milliseconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    /// anthropic-beta header value
    #[serde(default = "default_beta_header")]
    pub beta_header: String,

    /// OAuth credentials file (leading `~` is expanded)
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Usage endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// UI settings
    #[serde(default)]
    pub ui: UiSettings,
}

fn default_refresh_interval() -> u64 {
    30_000
}

fn default_http_timeout() -> u64 {
    8_000
}

fn default_beta_header() -> String {
    DEFAULT_BETA_HEADER.to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("~/.claude/.credentials.json")
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// UI-related settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Render without colors
    #[serde(default)]
    pub no_color: bool,

    /// Use the high-contrast palette
    #[serde(default)]
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            http_timeout_ms: default_http_timeout(),
            beta_header: default_beta_header(),
            credentials_path: default_credentials_path(),
            endpoint: default_endpoint(),
            ui: UiSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must exist
        if let Some(p) = path {
            return Self::load_file(p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("quotawatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/quotawatch/config.toml")),
            dirs::home_dir().map(|p| p.join(".quotawatch.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(settings)
    }

    /// Apply environment overrides.
    ///
    /// Returns human-readable warnings for values that were ignored.
    pub fn merge_env(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Ok(value) = std::env::var(ENV_BETA_HEADER) {
            let value = value.trim();
            if !value.is_empty() {
                self.beta_header = value.to_string();
            }
        }

        if let Ok(raw) = std::env::var(ENV_HTTP_TIMEOUT) {
            match parse_duration(&raw) {
                Ok(timeout) if !timeout.is_zero() => {
                    self.http_timeout_ms = duration_to_ms(timeout);
                }
                _ => {
                    let message = format!(
                        "warning: invalid {} {:?}; using {}",
                        ENV_HTTP_TIMEOUT,
                        raw,
                        format_duration(self.http_timeout())
                    );
                    warn!("{}", message);
                    warnings.push(message);
                }
            }
        }

        warnings
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(interval) = cli.interval {
            self.refresh_interval_ms = duration_to_ms(interval);
        }
        if let Some(timeout) = cli.http_timeout {
            self.http_timeout_ms = duration_to_ms(timeout);
        }
        if let Some(header) = &cli.beta_header {
            self.beta_header = header.trim().to_string();
        }
        if let Some(creds) = &cli.creds {
            self.credentials_path = creds.clone();
        }
        if cli.no_color {
            self.ui.no_color = true;
        }
        if cli.high_contrast {
            self.ui.high_contrast = true;
        }
    }

    /// Reject settings the refresh loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval() < MIN_REFRESH_INTERVAL {
            return Err(ConfigError::IntervalTooSmall);
        }
        if self.http_timeout_ms == 0 {
            return Err(ConfigError::NonPositiveTimeout);
        }
        if self.beta_header.trim().is_empty() {
            return Err(ConfigError::EmptyBetaHeader);
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// True while the baked-in header value is in use
    pub fn uses_default_beta_header(&self) -> bool {
        self.beta_header == DEFAULT_BETA_HEADER
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            refresh_interval: self.refresh_interval(),
            client_timeout: self.http_timeout(),
        }
    }

    pub fn client_config(&self, token: String) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            token,
            beta_header: self.beta_header.clone(),
            timeout: self.http_timeout(),
        }
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
