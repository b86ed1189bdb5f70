use super::{
    Content, CountTokensResponse, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, SafetySetting,
};
use crate::http::{error_from_response, parse_error, transport_error};
use async_trait::async_trait;
use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use redraft_interface::RewriteProvider;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const GEMINI_UNBLOCKED: &[&str] = &["HARM_CATEGORY_HARASSMENT"];

const AI_STUDIO_UNBLOCKED: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HATE_SPEECH",
];

/// REST client for Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    provider_name: &'static str,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiProvider {
    /// Gemini provider with harassment filtering disabled.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google API key
    /// * `model` - Model identifier, with or without the `models/` prefix
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_profile(api_key.into(), model.into(), "gemini", GEMINI_UNBLOCKED)
    }

    /// Google AI Studio provider: same API, all four harm filters disabled.
    pub fn ai_studio(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_profile(api_key.into(), model.into(), "aistudio", AI_STUDIO_UNBLOCKED)
    }

    fn with_profile(
        api_key: String,
        model: String,
        provider_name: &'static str,
        unblocked: &[&str],
    ) -> Self {
        let model = model
            .strip_prefix("models/")
            .map(str::to_string)
            .unwrap_or(model);
        debug!(provider = provider_name, model = %model, "Creating Gemini provider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            provider_name,
            safety_settings: unblocked
                .iter()
                .map(|category| SafetySetting::block_none(*category))
                .collect(),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            self.model,
            method
        )
    }

    async fn post<B: Serialize>(&self, method: &str, body: &B) -> ProviderResult<reqwest::Response> {
        let response = self
            .client
            .post(self.endpoint(method))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl RewriteProvider for GeminiProvider {
    #[instrument(skip(self, prompt), fields(provider = self.provider_name, model = %self.model, prompt_chars = prompt.len()))]
    async fn perform_rewrite(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        let request = GenerateContentRequest::builder()
            .contents(vec![Content::user(prompt)])
            .generation_config(Some(GenerationConfig::with_temperature(temperature)))
            .safety_settings(self.safety_settings.clone())
            .build()
            .map_err(|e| ProviderError::new(ProviderErrorKind::Builder(e.to_string())))?;

        let response = self.post("generateContent", &request).await.inspect_err(|e| {
            if e.kind.is_rate_limit() {
                warn!("Gemini API resource exhausted; the retry delay applies");
            }
        })?;

        let body: GenerateContentResponse = response.json().await.map_err(parse_error)?;
        let text = body.into_text()?;
        debug!(chars = text.len(), "Received generated text");
        Ok(text)
    }

    #[instrument(skip(self, text), fields(provider = self.provider_name, model = %self.model))]
    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        #[derive(Serialize)]
        struct CountTokensRequest {
            contents: Vec<Content>,
        }

        let request = CountTokensRequest {
            contents: vec![Content::user(text)],
        };
        let response = self
            .post("countTokens", &request)
            .await
            .map_err(|e| ProviderError::new(ProviderErrorKind::TokenCounting(e.kind.to_string())))?;
        let body: CountTokensResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::TokenCounting(format!(
                "unexpected countTokens response: {}",
                e
            )))
        })?;
        Ok(*body.total_tokens())
    }

    fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
