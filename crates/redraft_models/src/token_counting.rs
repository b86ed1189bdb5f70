//! Local token counting with tiktoken.

use redraft_error::{ProviderError, ProviderErrorKind, ProviderResult};
use tracing::warn;

/// Tokenizer for an OpenAI model, falling back to `cl100k_base` for
/// models tiktoken does not know.
pub fn openai_tokenizer(model: &str) -> ProviderResult<tiktoken_rs::CoreBPE> {
    match tiktoken_rs::get_bpe_from_model(model) {
        Ok(bpe) => Ok(bpe),
        Err(e) => {
            warn!(model, error = %e, "No tokenizer registered for model, using cl100k_base");
            tiktoken_rs::cl100k_base().map_err(|e| {
                ProviderError::new(ProviderErrorKind::TokenCounting(format!(
                    "Failed to load tokenizer: {}",
                    e
                )))
            })
        }
    }
}

/// Count tokens in `text`.
pub fn count_tokens_tiktoken(text: &str, tokenizer: &tiktoken_rs::CoreBPE) -> usize {
    tokenizer.encode_with_special_tokens(text).len()
}
