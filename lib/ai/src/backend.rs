//! Model provider abstraction.
//!
//! A provider exposes two generation primitives: schema-constrained
//! generation returning a JSON value, and free-text generation. Both report
//! token usage alongside their output.

use crate::error::ProviderError;
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A JSON Schema that structured generation must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Schema name, sent to providers that require one.
    pub name: String,
    /// The JSON Schema document.
    pub schema: JsonValue,
}

impl OutputSchema {
    /// Creates a named output schema.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: JsonValue) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Checks that `value` conforms to this schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` listing every violation, or if the schema
    /// itself does not compile.
    pub fn validate(&self, value: &JsonValue) -> Result<(), ProviderError> {
        let compiled =
            JSONSchema::compile(&self.schema).map_err(|e| ProviderError::SchemaMismatch {
                reason: format!("schema '{}' is invalid: {e}", self.name),
            })?;

        let violations: Vec<String> = match compiled.validate(value) {
            Ok(()) => return Ok(()),
            Err(errors) => errors
                .map(|e| format!("{} at '{}'", e, e.instance_path))
                .collect(),
        };
        Err(ProviderError::SchemaMismatch {
            reason: format!("'{}': {}", self.name, violations.join("; ")),
        })
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u64,
    /// Number of output tokens.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Creates a usage record.
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Output of schema-constrained generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredGeneration {
    /// The generated value.
    pub value: JsonValue,
    /// Token usage for the request.
    pub usage: TokenUsage,
}

/// Output of free-text generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextGeneration {
    /// The generated text.
    pub text: String,
    /// Token usage for the request.
    pub usage: TokenUsage,
}

/// Trait for model providers.
///
/// Implementations own their transport and connection lifecycle.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generates a value conforming to `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails, the output cannot
    /// be parsed as JSON, or it does not conform to `schema`.
    async fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<StructuredGeneration, ProviderError>;

    /// Generates free text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider request fails.
    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<TextGeneration, ProviderError>;

    /// Returns the provider name, used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for Arc<P> {
    async fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<StructuredGeneration, ProviderError> {
        (**self)
            .generate_structured(model, prompt, system, schema)
            .await
    }

    async fn generate_text(
        &self,
        model: &str,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<TextGeneration, ProviderError> {
        (**self).generate_text(model, prompt, system).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ModelProvider for Echo {
        async fn generate_structured(
            &self,
            _model: &str,
            prompt: &str,
            _system: Option<&str>,
            _schema: &OutputSchema,
        ) -> Result<StructuredGeneration, ProviderError> {
            Ok(StructuredGeneration {
                value: serde_json::json!({ "echo": prompt }),
                usage: TokenUsage::new(1, 1),
            })
        }

        async fn generate_text(
            &self,
            _model: &str,
            prompt: &str,
            _system: Option<&str>,
        ) -> Result<TextGeneration, ProviderError> {
            Ok(TextGeneration {
                text: prompt.to_string(),
                usage: TokenUsage::new(2, 3),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
        assert_eq!(TokenUsage::default().total(), 0);
    }

    #[test]
    fn token_usage_total_saturates() {
        let usage = TokenUsage::new(u64::MAX, 10);
        assert_eq!(usage.total(), u64::MAX);
    }

    fn queries_schema() -> OutputSchema {
        OutputSchema::new(
            "queries",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "queries": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["queries"],
                "additionalProperties": false
            }),
        )
    }

    #[test]
    fn conforming_value_validates() {
        let value = serde_json::json!({"queries": ["rust retry", "linear backoff"]});
        assert_eq!(queries_schema().validate(&value), Ok(()));
    }

    #[test]
    fn nonconforming_value_is_schema_mismatch() {
        let err = queries_schema()
            .validate(&serde_json::json!({"wrong": 1}))
            .unwrap_err();
        match err {
            ProviderError::SchemaMismatch { reason } => {
                assert!(reason.contains("queries"));
            }
            other => panic!("expected schema mismatch, got {other}"),
        }
    }

    #[test]
    fn invalid_schema_is_schema_mismatch() {
        let schema = OutputSchema::new("broken", serde_json::json!({"type": 12}));
        assert!(matches!(
            schema.validate(&serde_json::json!({})),
            Err(ProviderError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn arc_provider_delegates() {
        let provider: Arc<dyn ModelProvider> = Arc::new(Echo);
        let shared = Arc::clone(&provider);

        let text = shared.generate_text("m", "hello", None).await.expect("text");
        assert_eq!(text.text, "hello");
        assert_eq!(text.usage.total(), 5);

        let schema = OutputSchema::new("echo", serde_json::json!({"type": "object"}));
        let structured = shared
            .generate_structured("m", "hi", Some("sys"), &schema)
            .await
            .expect("structured");
        assert_eq!(structured.value["echo"], "hi");
        assert_eq!(shared.name(), "echo");
    }
}
