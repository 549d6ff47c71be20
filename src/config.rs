//! Engine configuration
//!
//! Default fetch hints forwarded to the data fetcher when a raw query does
//! not carry its own. Loadable from a TOML file with environment variable
//! overrides.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML
    #[error("parse error: {0}")]
    Parse(String),

    /// An environment override holds an unusable value
    #[error("invalid value for {var}: {value}")]
    InvalidEnv {
        /// The environment variable
        var: String,
        /// The rejected value
        value: String,
    },
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Sampling interval hint passed to fetches without their own,
    /// in milliseconds
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: i64,

    /// Cap hint on points returned per fetch without its own
    #[serde(default = "default_max_datapoints")]
    pub default_max_datapoints: i64,
}

fn default_interval_ms() -> i64 {
    64
}

fn default_max_datapoints() -> i64 {
    5000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: default_interval_ms(),
            default_max_datapoints: default_max_datapoints(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `FORMULARY_*` environment variable overrides
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_i64("FORMULARY_DEFAULT_INTERVAL_MS")? {
            self.default_interval_ms = v;
        }
        if let Some(v) = env_i64("FORMULARY_DEFAULT_MAX_DATAPOINTS")? {
            self.default_max_datapoints = v;
        }
        Ok(self)
    }
}

fn env_i64(var: &str) -> Result<Option<i64>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
    }
}
