use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for one batch extraction run. Prefixes are blob URIs
/// (`scheme://bucket/prefix/`); the output prefix should end with a slash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub endpoint: String,
    pub processor: String,
    pub input_prefix: String,
    pub output_prefix: String,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    pub auth_token: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8089/".into(),
            processor: String::new(),
            input_prefix: String::new(),
            output_prefix: String::new(),
            poll_interval_secs: 10,
            timeout_secs: 1400,
            auth_token: None,
        }
    }
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
