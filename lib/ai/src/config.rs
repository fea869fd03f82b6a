//! Retry configuration for model calls.
//!
//! Loaded via the `config` crate from environment variables
//! (`MAX_RETRY_ATTEMPTS`, `RETRY_DELAY_MS`).

use crate::error::ConfigError;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry behavior for the model caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum provider invocations per call, including the first.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Base backoff unit in milliseconds.
    /// The wait before retry `n` is `n * retry_delay_ms`.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_retry_attempts` is zero.
    pub fn new(max_retry_attempts: u32, retry_delay: Duration) -> Result<Self, Report<ConfigError>> {
        let config = Self {
            max_retry_attempts,
            retry_delay_ms: u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or a value is invalid.
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        let source = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .map_err(ConfigError::from)?;
        Self::from_config(source)
    }

    /// Deserializes and validates configuration from a prepared source.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or a value is invalid.
    pub fn from_config(source: config::Config) -> Result<Self, Report<ConfigError>> {
        let config: Self = source.try_deserialize().map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration allows at least one attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_retry_attempts` is zero.
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if self.max_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_retry_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Returns the base backoff unit.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Returns the wait before the retry that follows failed attempt `attempt`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay().saturating_mul(attempt)
    }
}
