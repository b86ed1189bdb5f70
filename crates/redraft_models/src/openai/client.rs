use super::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::http::{error_from_response, parse_error, transport_error};
use crate::token_counting::{count_tokens_tiktoken, openai_tokenizer};
use async_trait::async_trait;
use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use redraft_interface::RewriteProvider;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str =
    "You are a master literary editor. Follow the user's instructions precisely.";

/// OpenAI chat completions client.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    tokenizer: Arc<tiktoken_rs::CoreBPE>,
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider.
    ///
    /// # Errors
    ///
    /// Fails only if no tokenizer at all can be loaded.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> ProviderResult<Self> {
        let model = model.into();
        let tokenizer = openai_tokenizer(&model)?;
        debug!(model = %model, "Creating OpenAI provider");
        Ok(Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RewriteProvider for OpenAIProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn perform_rewrite(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        let request = ChatCompletionRequest::builder()
            .model(self.model.clone())
            .messages(vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)])
            .temperature(Some(temperature))
            .build()
            .map_err(|e| ProviderError::new(ProviderErrorKind::Builder(e.to_string())))?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ChatCompletionResponse = response.json().await.map_err(parse_error)?;
        let text = body.into_text()?;
        debug!(chars = text.len(), "Received completion");
        Ok(text)
    }

    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        Ok(count_tokens_tiktoken(text, &self.tokenizer))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
