//! Mock provider for testing.

use async_trait::async_trait;
use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use redraft_interface::RewriteProvider;
use std::sync::{Arc, Mutex};

/// Computes a response from the prompt.
pub type Responder = Arc<dyn Fn(&str) -> ProviderResult<String> + Send + Sync>;

/// Behavior configuration for mock responses.
#[derive(Clone)]
pub enum MockBehavior {
    /// Always return success with the given text
    Success(String),
    /// Always return the specified error
    Error(ProviderErrorKind),
    /// Fail N times with the error, then succeed with the text
    FailThenSucceed {
        fail_count: usize,
        error: ProviderErrorKind,
        success_text: String,
    },
    /// Answer each prompt with a function of the prompt
    Responder(Responder),
}

/// What a recorded prompt was asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Glossary,
    Summary,
    Rewrite,
}

impl CallKind {
    /// Classify a prompt sent by the pipeline.
    pub fn of(prompt: &str) -> Self {
        if prompt.contains("TEXT TO ANALYZE") {
            CallKind::Glossary
        } else if prompt.starts_with("Summarize the following book chapter") {
            CallKind::Summary
        } else {
            CallKind::Rewrite
        }
    }
}

/// Mock provider for testing.
///
/// Records every prompt and temperature it receives. Token counts are
/// the number of whitespace-separated words unless counting is set to
/// fail.
#[derive(Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<(String, f32)>>>,
    count_calls: Arc<Mutex<usize>>,
    fail_token_count: bool,
}

impl MockProvider {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
            count_calls: Arc::new(Mutex::new(0)),
            fail_token_count: false,
        }
    }

    /// Always succeed with `text`.
    pub fn new_success(text: impl Into<String>) -> Self {
        Self::with_behavior(MockBehavior::Success(text.into()))
    }

    /// Always fail with `error`.
    pub fn new_error(error: ProviderErrorKind) -> Self {
        Self::with_behavior(MockBehavior::Error(error))
    }

    /// Fail `fail_count` times, then succeed.
    pub fn new_fail_then_succeed(
        fail_count: usize,
        error: ProviderErrorKind,
        success_text: impl Into<String>,
    ) -> Self {
        Self::with_behavior(MockBehavior::FailThenSucceed {
            fail_count,
            error,
            success_text: success_text.into(),
        })
    }

    /// Answer with `responder(prompt)`.
    pub fn new_responder(
        responder: impl Fn(&str) -> ProviderResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self::with_behavior(MockBehavior::Responder(Arc::new(responder)))
    }

    /// Make `count_tokens` fail.
    pub fn failing_token_count(mut self) -> Self {
        self.fail_token_count = true;
        self
    }

    /// Number of `perform_rewrite` calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of `count_tokens` calls.
    pub fn count_calls(&self) -> usize {
        *self.count_calls.lock().unwrap()
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    /// Temperatures received, in order.
    pub fn temperatures(&self) -> Vec<f32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, temperature)| *temperature)
            .collect()
    }

    /// Kinds of the prompts received, in order.
    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.prompts().iter().map(|p| CallKind::of(p)).collect()
    }

    fn next_response(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((prompt.to_string(), temperature));
            calls.len() - 1
        };

        match &self.behavior {
            MockBehavior::Success(text) => Ok(text.clone()),
            MockBehavior::Error(kind) => Err(ProviderError::new(kind.clone())),
            MockBehavior::FailThenSucceed {
                fail_count,
                error,
                success_text,
            } => {
                if call_index < *fail_count {
                    Err(ProviderError::new(error.clone()))
                } else {
                    Ok(success_text.clone())
                }
            }
            MockBehavior::Responder(responder) => responder(prompt),
        }
    }
}

#[async_trait]
impl RewriteProvider for MockProvider {
    async fn perform_rewrite(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        self.next_response(prompt, temperature)
    }

    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        *self.count_calls.lock().unwrap() += 1;
        if self.fail_token_count {
            return Err(ProviderError::new(ProviderErrorKind::TokenCounting(
                "mock counter offline".to_string(),
            )));
        }
        Ok(text.split_whitespace().count())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// The number following `<prefix>-` in `text`, if present.
pub fn marker(text: &str, prefix: &str) -> Option<usize> {
    let needle = format!("{prefix}-");
    let start = text.find(&needle)? + needle.len();
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// A responder that behaves like a cooperative model:
///
/// - glossary prompts get a one-character glossary
/// - summary prompts for `REWRITTEN-n` / `ORIGINAL-n` get `summary-n`
/// - rewrite prompts for `ORIGINAL-n` get `REWRITTEN-n`, except chapters
///   listed in `failing`, which fail with a transport error
pub fn book_responder(
    failing: &'static [usize],
) -> impl Fn(&str) -> ProviderResult<String> + Send + Sync + 'static {
    move |prompt: &str| match CallKind::of(prompt) {
        CallKind::Glossary => Ok(r#"{"characters": ["Alex"]}"#.to_string()),
        CallKind::Summary => {
            let n = marker(prompt, "REWRITTEN")
                .or_else(|| marker(prompt, "ORIGINAL"))
                .unwrap_or(0);
            Ok(format!("summary-{n}"))
        }
        CallKind::Rewrite => {
            let n = marker(prompt, "ORIGINAL").unwrap_or(0);
            if failing.contains(&n) {
                Err(ProviderError::new(ProviderErrorKind::Transport(format!(
                    "connection reset on chapter {n}"
                ))))
            } else {
                Ok(format!("REWRITTEN-{n}"))
            }
        }
    }
}
