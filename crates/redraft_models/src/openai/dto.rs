//! Chat completion request and response bodies.

use derive_builder::Builder;
use derive_getters::Getters;
use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use serde::{Deserialize, Serialize};

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    role: String,
    /// Message text; `null` in some refusals
    #[serde(default)]
    content: Option<String>,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct ChatCompletionRequest {
    /// Model identifier
    model: String,
    /// Conversation
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// Creates a new builder for `ChatCompletionRequest`.
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }
}

/// One completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatChoice {
    /// Generated message
    message: ChatMessage,
    /// Why generation stopped, e.g. `stop`, `length`, `content_filter`
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Response of `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ChatCompletionResponse {
    /// Completion choices
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice.
    ///
    /// # Errors
    ///
    /// `PolicyBlocked` when the content filter stopped generation;
    /// `EmptyResponse` when no text came back.
    pub fn into_text(self) -> ProviderResult<String> {
        let Some(choice) = self.choices.into_iter().next() else {
            return Err(ProviderError::new(ProviderErrorKind::EmptyResponse(
                "no choices".to_string(),
            )));
        };

        let reason = choice.finish_reason.unwrap_or_else(|| "unknown".to_string());
        if reason == "content_filter" {
            return Err(ProviderError::new(ProviderErrorKind::PolicyBlocked(reason)));
        }

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::new(ProviderErrorKind::EmptyResponse(reason))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_choice_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "Rewritten."}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "Rewritten.");
    }

    #[test]
    fn test_content_filter_is_policy_block() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "content_filter"}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_text().unwrap_err().kind,
            ProviderErrorKind::PolicyBlocked("content_filter".to_string())
        );
    }

    #[test]
    fn test_blank_content_is_empty_response() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  "}, "finish_reason": "length"}]}"#,
        )
        .unwrap();
        assert_eq!(
            response.into_text().unwrap_err().kind,
            ProviderErrorKind::EmptyResponse("length".to_string())
        );
    }

    #[test]
    fn test_request_omits_unset_temperature() {
        let request = ChatCompletionRequest::builder()
            .model("gpt-4o")
            .messages(vec![ChatMessage::user("hi")])
            .build()
            .unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
