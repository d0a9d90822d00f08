//! Configuration loading for weave-service.
//!
//! Configuration is loaded from a TOML file (default: `weave.toml`).

use serde::Deserialize;
use std::path::PathBuf;
use weave_graph::RelationshipPolicy;

/// Root configuration for weave-service.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Relationship policy flags.
    #[serde(default)]
    pub policy: RelationshipPolicy,
    /// Input and retry limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
    /// Connection pool size (default: 10).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Input and retry limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum display-name length in characters; longer names are
    /// truncated at registration and update (default: 256).
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
    /// Maximum username length in characters; longer usernames are
    /// rejected (default: 64).
    #[serde(default = "default_max_username_len")]
    pub max_username_len: usize,
    /// How many times a transient storage failure is retried before
    /// surfacing as unavailable (default: 1).
    #[serde(default = "default_storage_retries")]
    pub storage_retries: u32,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("weave.db")
}

fn default_max_connections() -> u32 {
    10
}

fn default_max_name_len() -> usize {
    256
}

fn default_max_username_len() -> usize {
    64
}

fn default_storage_retries() -> u32 {
    1
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            max_username_len: default_max_username_len(),
            storage_retries: default_storage_retries(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
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
}
