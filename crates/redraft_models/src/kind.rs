//! Provider selection.

use crate::{GeminiProvider, OpenAIProvider};
use redraft_error::{ProviderError, ProviderErrorKind, RedraftResult};
use redraft_interface::RewriteProvider;
use redraft_rate_limit::ProviderLimits;
use std::str::FromStr;
use tracing::{info, instrument};

/// Supported provider names.
///
/// # Examples
///
/// ```
/// use redraft_models::ProviderKind;
///
/// assert_eq!(ProviderKind::parse("OpenAI").unwrap(), ProviderKind::OpenAi);
/// assert_eq!(ProviderKind::AiStudio.to_string(), "aistudio");
/// assert!(ProviderKind::parse("anthropic").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    /// Google Gemini
    Gemini,
    /// Google AI Studio
    AiStudio,
    /// OpenAI
    OpenAi,
}

impl ProviderKind {
    /// Parse a provider name, failing with `UnsupportedProvider`.
    pub fn parse(name: &str) -> RedraftResult<Self> {
        Ok(Self::from_str(name.trim()).map_err(|_| {
            ProviderError::new(ProviderErrorKind::UnsupportedProvider(name.to_string()))
        })?)
    }

    /// Environment variable holding the key when configuration names none.
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GOOGLE_API_KEY",
            ProviderKind::AiStudio => "AISTUDIO_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Construct the provider for `kind`.
///
/// # Errors
///
/// `MissingApiKey` when neither the configuration nor the environment
/// holds a usable key.
#[instrument(skip(limits))]
pub fn build_provider(
    kind: ProviderKind,
    model: &str,
    limits: &ProviderLimits,
) -> RedraftResult<Box<dyn RewriteProvider>> {
    let mut limits = limits.clone();
    if limits.api_key_env.is_none() {
        limits.api_key_env = Some(kind.default_api_key_env().to_string());
    }
    let api_key = limits
        .resolve_api_key()
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::MissingApiKey(kind.to_string())))?;

    let provider: Box<dyn RewriteProvider> = match kind {
        ProviderKind::Gemini | ProviderKind::AiStudio => {
            let provider = if kind == ProviderKind::Gemini {
                GeminiProvider::new(api_key, model)
            } else {
                GeminiProvider::ai_studio(api_key, model)
            };
            match &limits.base_url {
                Some(url) => Box::new(provider.with_base_url(url.clone())),
                None => Box::new(provider),
            }
        }
        ProviderKind::OpenAi => {
            let provider = OpenAIProvider::new(api_key, model)?;
            match &limits.base_url {
                Some(url) => Box::new(provider.with_base_url(url.clone())),
                None => Box::new(provider),
            }
        }
    };

    info!(provider = %kind, model, "Provider ready");
    Ok(provider)
}
