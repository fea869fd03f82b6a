//! Error types for the AI crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ProviderError`: Low-level failures reported by a model provider
//! - `ModelCallError`: A model call that gave up after its retry budget
//! - `ConfigError`: Invalid or unloadable configuration

use deep_research_core::CallId;
use std::fmt;

/// Errors from model provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider is unavailable.
    ProviderUnavailable { provider: String, reason: String },
    /// Request failed.
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Rate limit exceeded.
    RateLimited { retry_after_secs: Option<u64> },
    /// Generated output did not match the requested schema.
    SchemaMismatch { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { provider, reason } => {
                write!(f, "model provider '{provider}' unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "model request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
            Self::Timeout => write!(f, "model request timed out"),
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::SchemaMismatch { reason } => {
                write!(f, "output did not match schema: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from the retrying model caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCallError {
    /// Every permitted attempt failed.
    RetriesExhausted {
        call_id: CallId,
        model: String,
        activity_kind: String,
        attempts: u32,
        /// The failure from the final attempt, if any attempt ran.
        last_error: Option<ProviderError>,
    },
}

impl ModelCallError {
    /// Returns the provider failure from the final attempt.
    #[must_use]
    pub fn last_error(&self) -> Option<&ProviderError> {
        match self {
            Self::RetriesExhausted { last_error, .. } => last_error.as_ref(),
        }
    }

    /// Returns the number of provider invocations that were made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }
}

impl fmt::Display for ModelCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted {
                call_id,
                model,
                activity_kind,
                attempts,
                last_error,
            } => match last_error {
                Some(err) => write!(
                    f,
                    "model call {call_id} ({activity_kind}) to '{model}' failed after {attempts} attempts: {err}"
                ),
                None => write!(
                    f,
                    "model call {call_id} ({activity_kind}) to '{model}' exhausted retries after {attempts} attempts"
                ),
            },
        }
    }
}

impl std::error::Error for ModelCallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value is out of range.
    InvalidValue { field: &'static str, reason: String },
    /// The configuration sources could not be read or deserialized.
    Load { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value '{field}': {reason}")
            }
            Self::Load { reason } => {
                write!(f, "failed to load configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        Self::Load {
            reason: err.to_string(),
        }
    }
}
