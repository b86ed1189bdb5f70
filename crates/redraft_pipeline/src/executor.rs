//! Rate-limited, retrying submission of prompts to one provider.

use redraft_error::{ProviderResult, RetryableError};
use redraft_interface::RewriteProvider;
use redraft_rate_limit::{ProviderLimits, RateLimiter, RetryPolicy, RetryStep};
use tracing::{debug, error, info, instrument, warn};

/// Sampling temperature for chapter rewrites.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Characters per token assumed when the provider cannot count.
const CHARS_PER_TOKEN: usize = 4;

/// Output is assumed to be about as long as the prompt, so a call is
/// charged this many times the prompt's tokens.
const OUTPUT_RATIO: usize = 2;

/// Wraps a provider with the shared rate limiter and the retry policy.
///
/// # Example
///
/// ```rust,ignore
/// use redraft_pipeline::{DEFAULT_TEMPERATURE, RequestExecutor};
///
/// let executor = RequestExecutor::from_limits(provider, &limits);
/// let text = executor.rewrite_chapter(&prompt, DEFAULT_TEMPERATURE).await?;
/// ```
pub struct RequestExecutor<P: RewriteProvider> {
    provider: P,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl<P: RewriteProvider> RequestExecutor<P> {
    /// Create an executor from its parts.
    pub fn new(provider: P, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            provider,
            limiter,
            policy,
        }
    }

    /// Create an executor whose limiter and policy follow `limits`.
    pub fn from_limits(provider: P, limits: &ProviderLimits) -> Self {
        Self::new(provider, RateLimiter::from_limits(limits), limits.retry_policy())
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The shared rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Tokens in `text`, estimated from its length when the provider
    /// cannot count them.
    #[instrument(skip(self, text), fields(provider = self.provider.provider_name(), chars = text.len()))]
    pub async fn estimate_tokens(&self, text: &str) -> usize {
        match self.provider.count_tokens(text).await {
            Ok(tokens) => tokens,
            Err(e) => {
                let estimate = text.chars().count() / CHARS_PER_TOKEN;
                warn!(error = %e, estimate, "Token counting failed, using length estimate");
                estimate
            }
        }
    }

    /// Rewrite with rate limiting and retries.
    ///
    /// # Errors
    ///
    /// The last provider error once retries are exhausted, or the first
    /// error that is not worth retrying.
    pub async fn rewrite_chapter(&self, prompt: &str, temperature: f32) -> ProviderResult<String> {
        let prompt_tokens = self.estimate_tokens(prompt).await;
        self.submit(prompt, temperature, prompt_tokens).await
    }

    /// [`RequestExecutor::rewrite_chapter`] for a prompt whose tokens were
    /// already counted.
    ///
    /// The limiter is consulted once, for twice the prompt's tokens; then
    /// up to `retry_attempts + 1` attempts are made, sleeping
    /// `retry_delay × 2^n` before retry `n`.
    #[instrument(
        skip(self, prompt),
        fields(
            provider = self.provider.provider_name(),
            model = self.provider.model_name()
        )
    )]
    pub async fn submit(
        &self,
        prompt: &str,
        temperature: f32,
        prompt_tokens: usize,
    ) -> ProviderResult<String> {
        let estimated_tokens = prompt_tokens.saturating_mul(OUTPUT_RATIO);
        let _guard = self.limiter.acquire(estimated_tokens as u64).await;

        let mut schedule = self.policy.backoff();
        let mut attempt: u32 = 1;
        loop {
            info!(attempt, "Submitting request to {}", self.provider.provider_name());
            let error = match self.provider.perform_rewrite(prompt, temperature).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "Request succeeded");
                    return Ok(text);
                }
                Err(error) => error,
            };

            match self.policy.next_step(&error, schedule.next()) {
                RetryStep::Retry(delay) => {
                    if error.kind.is_rate_limit() {
                        warn!(
                            attempt,
                            retry_in_secs = delay.as_secs_f64(),
                            error = %error.kind,
                            "Rate limited by provider"
                        );
                    } else {
                        warn!(
                            attempt,
                            retry_in_secs = delay.as_secs_f64(),
                            error = %error.kind,
                            "Request failed"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryStep::GiveUp => {
                    if error.is_retryable() {
                        error!(attempts = attempt, error = %error.kind, "All attempts failed");
                    } else {
                        error!(attempts = attempt, error = %error.kind, "Request failed permanently");
                    }
                    return Err(error);
                }
            }
        }
    }
}
