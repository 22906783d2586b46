//! Configuration loading for the sync coordinator.
//!
//! Configuration is loaded from a TOML file (default: `portal-sync.toml`).
//! Every section and field is optional.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use sync_core::SyncPolicy;
use sync_types::SyncKind;

/// Root configuration for the sync coordinator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sync timing configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Remote API configuration.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Sync timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Assignment refresh interval in milliseconds (default: 60000).
    #[serde(default = "default_interval_ms")]
    pub assignments_interval_ms: u64,
    /// Submission refresh interval in milliseconds (default: 60000).
    #[serde(default = "default_interval_ms")]
    pub submissions_interval_ms: u64,
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the portal API (default: http://localhost:3000/api).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request (optional).
    pub token: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_interval_ms() -> u64 {
    60_000 // 1 minute
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            assignments_interval_ms: default_interval_ms(),
            submissions_interval_ms: default_interval_ms(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_file`] for an existing file.
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a zero interval or timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.assignments_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sync.assignments_interval_ms must be greater than 0".into(),
            ));
        }
        if self.sync.submissions_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sync.submissions_interval_ms must be greater than 0".into(),
            ));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "remote.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Sync policy built from the `[sync]` section.
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy::new()
            .with_interval(
                SyncKind::Assignments,
                Duration::from_millis(self.sync.assignments_interval_ms),
            )
            .with_interval(
                SyncKind::Submissions,
                Duration::from_millis(self.sync.submissions_interval_ms),
            )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
