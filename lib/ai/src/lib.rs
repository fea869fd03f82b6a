//! Model calling for deep-research.
//!
//! The central type is [`ModelCaller`], which wraps a [`ModelProvider`] with:
//!
//! - **Dispatch**: structured generation when a call carries an output
//!   schema, free-text generation otherwise
//! - **Retries**: a bounded number of attempts with linear backoff, logging
//!   a warning to the session's [`ActivityTracker`] before each retry
//! - **Accounting**: token usage and completed steps recorded on a
//!   [`UsageAccumulator`] such as [`ResearchState`]

pub mod activity;
pub mod backend;
pub mod caller;
pub mod config;
pub mod error;
#[cfg(feature = "openrouter")]
pub mod openrouter;
pub mod request;
pub mod state;

pub use activity::{ActivityEntry, ActivityStatus, ActivityTracker, InMemoryActivityTracker};
pub use backend::{ModelProvider, OutputSchema, StructuredGeneration, TextGeneration, TokenUsage};
pub use caller::ModelCaller;
pub use config::RetryConfig;
pub use error::{ConfigError, ModelCallError, ProviderError};
#[cfg(feature = "openrouter")]
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};
pub use request::{CallRequest, DEFAULT_ACTIVITY_KIND, GenerationResult};
pub use state::{ResearchState, UsageAccumulator, UsageSnapshot};
