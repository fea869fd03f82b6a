//! OpenRouter model provider.
//!
//! Talks to the OpenAI-compatible chat completions endpoint. Structured
//! generation requests a `json_schema` response format, parses the returned
//! message content as JSON and validates it against the requested schema.

use crate::backend::{ModelProvider, OutputSchema, StructuredGeneration, TextGeneration, TokenUsage};
use crate::error::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::debug;

const PROVIDER_NAME: &str = "openrouter";

/// OpenRouter connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    /// API key sent as a bearer token.
    pub api_key: String,

    /// Base URL of the API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl OpenRouterConfig {
    /// Creates a configuration with default endpoint and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Loads configuration from `OPENROUTER_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENROUTER_API_KEY` is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("OPENROUTER").try_parsing(true))
            .build()
            .map_err(ConfigError::from)?
            .try_deserialize()
            .map_err(ConfigError::from)?;
        Ok(config)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonValue>,
}

impl<'a> ChatRequest<'a> {
    fn new(
        model: &'a str,
        prompt: &'a str,
        system: Option<&'a str>,
        schema: Option<&OutputSchema>,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let response_format = schema.map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema,
                },
            })
        });

        Self {
            model,
            messages,
            response_format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl ChatResponse {
    /// Splits the response into the first choice's content and its usage.
    fn into_content(self) -> Result<(String, TokenUsage), ProviderError> {
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        let content = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ResponseParseFailed {
                reason: "response contained no choices".to_string(),
            })?
            .message
            .content
            .unwrap_or_default();
        Ok((content, usage))
    }
}

/// Parses structured output, tolerating a surrounding markdown code fence.
fn parse_structured(content: &str) -> Result<JsonValue, ProviderError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim()).map_err(|e| ProviderError::ResponseParseFailed {
        reason: format!("structured output is not valid JSON: {e}"),
    })
}

fn map_transport_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_connect() {
        ProviderError::ProviderUnavailable {
            provider: PROVIDER_NAME.to_string(),
            reason: err.to_string(),
        }
    } else {
        ProviderError::RequestFailed {
            reason: err.to_string(),
        }
    }
}

/// Model provider backed by the OpenRouter API.
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    http: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Creates a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenRouterConfig) -> Result<Self, Report<ProviderError>> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::ProviderUnavailable {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    async fn complete(&self, body: &ChatRequest<'_>) -> Result<(String, TokenUsage), ProviderError> {
        debug!(model = body.model, structured = body.response_format.is_some(), "sending chat completion");

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed {
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParseFailed {
                reason: e.to_string(),
            })?;
        parsed.into_content()
    }
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
    async fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<StructuredGeneration, ProviderError> {
        let body = ChatRequest::new(model, prompt, system, Some(schema));
        let (content, usage) = self.complete(&body).await?;
        let value = parse_structured(&content)?;
        schema.validate(&value)?;
        Ok(StructuredGeneration { value, usage })
    }

    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<TextGeneration, ProviderError> {
        let body = ChatRequest::new(model, prompt, system, None);
        let (text, usage) = self.complete(&body).await?;
        Ok(TextGeneration { text, usage })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}
