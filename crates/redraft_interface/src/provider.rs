//! Rewrite provider capability.

use async_trait::async_trait;
use redraft_error::ProviderResult;

/// A text-generation backend.
///
/// Implementations map these two calls onto one vendor API and nothing
/// else. An empty or blocked response must surface as an error, never as
/// an empty string.
///
/// # Example
///
/// ```rust,ignore
/// use redraft_interface::RewriteProvider;
///
/// async fn rewrite(provider: &dyn RewriteProvider, prompt: &str) {
///     let tokens = provider.count_tokens(prompt).await?;
///     let text = provider.perform_rewrite(prompt, 0.7).await?;
/// }
/// ```
#[async_trait]
pub trait RewriteProvider: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn perform_rewrite(&self, prompt: &str, temperature: f32) -> ProviderResult<String>;

    /// Count the tokens the provider would charge for `text`.
    async fn count_tokens(&self, text: &str) -> ProviderResult<usize>;

    /// Provider name for logging (e.g., "gemini", "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier in use.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<P: RewriteProvider + ?Sized> RewriteProvider for Box<P> {
    async fn perform_rewrite(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        (**self).perform_rewrite(prompt, temperature).await
    }

    async fn count_tokens(&self, text: &str) -> ProviderResult<usize> {
        (**self).count_tokens(text).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
