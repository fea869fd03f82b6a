//! Retrying model caller.
//!
//! Dispatches a [`CallRequest`] to structured or free-text generation,
//! records usage on success, and retries failed attempts with linear
//! backoff. Every provider failure is retried until the attempt budget is
//! spent.

use crate::activity::{ActivityStatus, ActivityTracker};
use crate::backend::{ModelProvider, TokenUsage};
use crate::config::RetryConfig;
use crate::error::{ModelCallError, ProviderError};
use crate::request::{CallRequest, GenerationResult};
use crate::state::UsageAccumulator;
use deep_research_core::CallId;
use rootcause::Report;
use tracing::{debug, error, info, instrument, warn};

/// Calls a model provider with retries and usage bookkeeping.
#[derive(Debug, Clone)]
pub struct ModelCaller<P> {
    provider: P,
    config: RetryConfig,
}

impl<P: ModelProvider> ModelCaller<P> {
    /// Creates a caller with the given retry configuration.
    #[must_use]
    pub fn new(provider: P, config: RetryConfig) -> Self {
        Self { provider, config }
    }

    /// Creates a caller with the default retry configuration.
    #[must_use]
    pub fn with_defaults(provider: P) -> Self {
        Self::new(provider, RetryConfig::default())
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes a model call.
    ///
    /// On success the usage total and one completed step are recorded on
    /// `state`. Each failed attempt that will be retried adds a warning to
    /// `tracker` and waits `retry_delay * attempt` before the next attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ModelCallError::RetriesExhausted`] with the last provider
    /// failure once every attempt has failed.
    #[instrument(
        skip_all,
        fields(
            call_id = tracing::field::Empty,
            provider = self.provider.name(),
            model = %request.model_id,
            activity_kind = %request.activity_kind,
        )
    )]
    pub async fn call(
        &self,
        request: &CallRequest,
        state: &dyn UsageAccumulator,
        tracker: &dyn ActivityTracker,
    ) -> Result<GenerationResult, Report<ModelCallError>> {
        let call_id = CallId::new();
        tracing::Span::current().record("call_id", tracing::field::display(call_id));
        let max_attempts = self.config.max_retry_attempts;
        let mut attempts = 0;
        let mut last_error: Option<ProviderError> = None;

        info!(
            system_prompt_chars = request.system_prompt_chars(),
            prompt_chars = request.prompt_chars(),
            structured = request.is_structured(),
            "starting model call"
        );

        while attempts < max_attempts {
            debug!(attempt = attempts + 1, max_attempts, "attempting model call");

            match self.attempt(request).await {
                Ok((result, usage)) => {
                    state.record_success(usage.total());
                    info!(
                        attempt = attempts + 1,
                        tokens = usage.total(),
                        "model call succeeded"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    attempts += 1;
                    warn!(
                        error = %err,
                        attempt = attempts,
                        max_attempts,
                        "model call attempt failed"
                    );
                    last_error = Some(err);

                    if attempts < max_attempts {
                        tracker.add(
                            &request.activity_kind,
                            ActivityStatus::Warning,
                            &format!(
                                "Model call failed, attempt {attempts}/{max_attempts}. Retrying..."
                            ),
                        );
                        let delay = self.config.delay_for_attempt(attempts);
                        debug!(?delay, "waiting before retry");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!(
            attempts,
            last_error = ?last_error,
            "model call failed after all attempts"
        );

        Err(ModelCallError::RetriesExhausted {
            call_id,
            model: request.model_id.clone(),
            activity_kind: request.activity_kind.clone(),
            attempts,
            last_error,
        }
        .into())
    }

    async fn attempt(
        &self,
        request: &CallRequest,
    ) -> Result<(GenerationResult, TokenUsage), ProviderError> {
        let system = request.system_prompt.as_deref();

        match &request.output_schema {
            Some(schema) => {
                let generated = self
                    .provider
                    .generate_structured(&request.model_id, &request.prompt, system, schema)
                    .await?;
                Ok((GenerationResult::Structured(generated.value), generated.usage))
            }
            None => {
                let generated = self
                    .provider
                    .generate_text(&request.model_id, &request.prompt, system)
                    .await?;
                Ok((GenerationResult::Text(generated.text), generated.usage))
            }
        }
    }
}
