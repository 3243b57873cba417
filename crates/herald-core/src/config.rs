//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration that sends nothing for real: without a `[provider]`
//! section the CLI uses the dry-run delivery client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::ProcessorConfig;
use crate::domain::JobDefaults;
use crate::queue::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Email provider connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,

    /// Sender address, e.g. `HR <hr@example.com>`.
    pub from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    /// Jobs claimed per processor run.
    pub batch_size: usize,

    /// Seconds between scheduled processor runs.
    pub interval_secs: u64,

    /// Jobs listed by the stats report.
    pub recent_jobs_limit: usize,

    /// Upper bound for one delivery call.
    pub send_timeout_secs: u64,

    /// Value of the `source` tag on every outbound email.
    pub source_tag: String,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Location of the file-backed job store.
    pub store_path: PathBuf,

    pub retry: RetryPolicy,
    pub defaults: JobDefaults,
    pub provider: Option<ProviderConfig>,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            interval_secs: 60,
            recent_jobs_limit: 20,
            send_timeout_secs: 30,
            source_tag: "herald".to_string(),
            log_level: "info".to_string(),
            store_path: PathBuf::from("herald-queue.json"),
            retry: RetryPolicy::default(),
            defaults: JobDefaults::default(),
            provider: None,
        }
    }
}

impl HeraldConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: HeraldConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be greater than 0".into()));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be greater than 0".into()));
        }
        if self.send_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "send_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.defaults.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "defaults.max_retries must be greater than 0".into(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.multiplier must be at least 1, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.base_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "retry.base_delay_secs must be greater than 0".into(),
            ));
        }
        if self.source_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("source_tag cannot be empty".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.batch_size,
            send_timeout: self.send_timeout(),
            source_tag: self.source_tag.clone(),
        }
    }
}
