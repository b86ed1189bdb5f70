//! Request and response bodies for `generateContent` and `countTokens`.

use derive_builder::Builder;
use derive_getters::Getters;
use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use serde::{Deserialize, Serialize};

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Part {
    /// Text of the part; non-text parts deserialize with `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    /// A text part.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A message: a role plus its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Content {
    /// `user` or `model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    /// Message parts
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    /// A single-part user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::from_text(text)],
        }
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    temperature: f32,
}

impl GenerationConfig {
    /// Config with the given temperature.
    pub fn with_temperature(temperature: f32) -> Self {
        Self { temperature }
    }
}

/// Blocking threshold for one harm category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SafetySetting {
    /// e.g. `HARM_CATEGORY_HARASSMENT`
    category: String,
    /// e.g. `BLOCK_NONE`
    threshold: String,
}

impl SafetySetting {
    /// Disable blocking for a category.
    pub fn block_none(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            threshold: "BLOCK_NONE".to_string(),
        }
    }
}

/// Body of `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation; a single user turn for rewrites
    contents: Vec<Content>,
    /// Sampling parameters
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    /// Per-category safety thresholds
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    /// Creates a new builder for `GenerateContentRequest`.
    pub fn builder() -> GenerateContentRequestBuilder {
        GenerateContentRequestBuilder::default()
    }
}

/// One generated candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when generation stopped before any output
    #[serde(default)]
    content: Option<Content>,
    /// Why generation stopped, e.g. `STOP`, `SAFETY`, `MAX_TOKENS`
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Verdict on the prompt itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was rejected
    #[serde(default)]
    block_reason: Option<String>,
}

/// Response of `generateContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates
    #[serde(default)]
    candidates: Vec<Candidate>,
    /// Prompt verdict
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate.
    ///
    /// # Errors
    ///
    /// `PolicyBlocked` when the prompt was rejected; `EmptyResponse`
    /// (carrying the finish reason) when no candidate text came back.
    pub fn into_text(self) -> ProviderResult<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Err(ProviderError::new(ProviderErrorKind::PolicyBlocked(reason)));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse(
                "no candidates".to_string(),
            )));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse(reason)));
        }
        Ok(text)
    }
}

/// Response of `countTokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    /// Tokens in the submitted contents
    total_tokens: usize,
}
