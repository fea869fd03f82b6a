//! Model call requests and their results.

use crate::backend::OutputSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Activity kind used when the caller does not supply one.
pub const DEFAULT_ACTIVITY_KIND: &str = "generate";

/// A single model call.
///
/// When an output schema is present the call uses structured generation;
/// otherwise it uses free-text generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Provider-specific model identifier.
    pub model_id: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Optional output schema for structured generation.
    pub output_schema: Option<OutputSchema>,
    /// Classification used to tag activity log entries.
    #[serde(default = "default_activity_kind")]
    pub activity_kind: String,
}

fn default_activity_kind() -> String {
    DEFAULT_ACTIVITY_KIND.to_string()
}

impl CallRequest {
    /// Creates a free-text request.
    #[must_use]
    pub fn new(model_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            prompt: prompt.into(),
            system_prompt: None,
            output_schema: None,
            activity_kind: default_activity_kind(),
        }
    }

    /// Adds a system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Adds an output schema, switching the call to structured generation.
    #[must_use]
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Sets the activity kind.
    #[must_use]
    pub fn with_activity_kind(mut self, kind: impl Into<String>) -> Self {
        self.activity_kind = kind.into();
        self
    }

    /// Returns the prompt length in characters.
    #[must_use]
    pub fn prompt_chars(&self) -> usize {
        self.prompt.chars().count()
    }

    /// Returns the system prompt length in characters, or 0 if absent.
    #[must_use]
    pub fn system_prompt_chars(&self) -> usize {
        self.system_prompt
            .as_deref()
            .map_or(0, |system| system.chars().count())
    }

    /// Returns true if this request uses structured generation.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        self.output_schema.is_some()
    }
}

/// The value produced by a successful model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GenerationResult {
    /// Output of structured generation.
    Structured(JsonValue),
    /// Output of free-text generation.
    Text(String),
}

impl GenerationResult {
    /// Returns the text, if this is a text result.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// Returns the structured value, if this is a structured result.
    #[must_use]
    pub fn as_structured(&self) -> Option<&JsonValue> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Consumes the result and returns the text, if this is a text result.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(_) => None,
        }
    }

    /// Deserializes the result into `T`.
    ///
    /// A text result is treated as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not deserialize into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Self::Structured(value) => serde_json::from_value(value),
            Self::Text(text) => serde_json::from_value(JsonValue::String(text)),
        }
    }
}
