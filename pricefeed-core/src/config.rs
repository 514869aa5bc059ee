//! Fetch configuration, loadable from TOML.
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ```toml
//! base_url = "https://query2.finance.yahoo.com"
//! max_retries = 20
//! initial_backoff_secs = 1.0
//! max_backoff_secs = 30.0
//! request_timeout_secs = 30.0
//! user_agent_pool = ["Mozilla/5.0 ..."]
//! ```

use crate::data::provider::FetchError;
use crate::data::user_agent::default_user_agents;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Scheme and host of the chart API; the chart path is appended.
    pub base_url: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_secs: f64,
    pub max_backoff_secs: f64,
    pub request_timeout_secs: f64,
    pub user_agent_pool: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 20,
            initial_backoff_secs: 1.0,
            max_backoff_secs: 30.0,
            request_timeout_secs: 30.0,
            user_agent_pool: default_user_agents(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("build transport: {0}")]
    Transport(#[from] FetchError),
}

impl FetchConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent_pool.is_empty() {
            return Err(ConfigError::Invalid("user_agent_pool is empty".into()));
        }
        for (name, value) in [
            ("initial_backoff_secs", self.initial_backoff_secs),
            ("max_backoff_secs", self.max_backoff_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{name} is too large for a duration, got {value}"
                )));
            }
        }
        if self.max_backoff_secs < self.initial_backoff_secs {
            return Err(ConfigError::Invalid(format!(
                "max_backoff_secs ({}) is below initial_backoff_secs ({})",
                self.max_backoff_secs, self.initial_backoff_secs
            )));
        }
        Ok(())
    }

    /// Total attempts, counting the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn initial_backoff(&self) -> Duration {
        secs_to_duration(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        secs_to_duration(self.max_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        secs_to_duration(self.request_timeout_secs)
    }
}

/// Saturating conversion for configs that skipped `validate`.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}
