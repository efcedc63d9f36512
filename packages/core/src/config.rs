/// Configuration for the batch orchestrator
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on concurrently in-flight external calls
///
/// The remote document service throttles well before this.
const MAX_SUPPORTED_CONCURRENCY: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Batch tuning knobs
///
/// Loading this from files or the environment is the host application's
/// job; the struct is plain serde data with defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker-pool width for per-item external calls
    pub max_concurrency: usize,

    /// Timeout for a single external call, in seconds
    pub call_timeout_secs: u64,

    /// How long a metadata listing stays cached, in seconds
    pub metadata_cache_ttl_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            call_timeout_secs: 30,
            metadata_cache_ttl_secs: 300,
        }
    }
}

impl BatchConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn metadata_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_cache_ttl_secs)
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency > MAX_SUPPORTED_CONCURRENCY {
            return Err(ConfigError::Invalid(format!(
                "max_concurrency cannot exceed {}",
                MAX_SUPPORTED_CONCURRENCY
            )));
        }

        if self.call_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
