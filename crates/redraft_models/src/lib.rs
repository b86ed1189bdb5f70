//! Text generation providers for redraft.
//!
//! Each provider implements [`redraft_interface::RewriteProvider`] over the
//! vendor's REST API:
//!
//! - **Gemini** (`gemini`) and **Google AI Studio** (`aistudio`) through
//!   `generateContent` / `countTokens`
//! - **OpenAI** (`openai`) through chat completions, counting tokens
//!   locally with tiktoken
//!
//! # Example
//!
//! ```no_run
//! use redraft_models::{ProviderKind, build_provider};
//! use redraft_rate_limit::ProviderLimits;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let kind: ProviderKind = ProviderKind::parse("gemini")?;
//! let provider = build_provider(kind, "gemini-2.0-flash", &ProviderLimits::default())?;
//! assert_eq!(provider.provider_name(), "gemini");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;
mod http;
mod kind;
mod openai;
mod token_counting;

pub use gemini::{
    Candidate, Content, CountTokensResponse, GeminiProvider, GenerateContentRequest,
    GenerateContentRequestBuilder, GenerateContentResponse, GenerationConfig, Part,
    PromptFeedback, SafetySetting,
};
pub use kind::{ProviderKind, build_provider};
pub use openai::{
    ChatChoice, ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse,
    ChatMessage, OpenAIProvider,
};
pub use token_counting::{count_tokens_tiktoken, openai_tokenizer};
