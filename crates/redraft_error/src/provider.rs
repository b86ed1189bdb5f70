//! Provider error types and retry classification.

/// Failure conditions reported by a rewrite provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// No usable API key was configured for the provider
    #[display("API key for provider '{}' is not set", _0)]
    MissingApiKey(String),
    /// Provider name did not match any known provider
    #[display("Unsupported provider: {}", _0)]
    UnsupportedProvider(String),
    /// Provider signalled quota exhaustion
    #[display("Rate limit exceeded: {}", _0)]
    RateLimitExceeded(String),
    /// Provider returned no usable content
    #[display("Response was empty: {}", _0)]
    EmptyResponse(String),
    /// Provider refused the prompt on content-policy grounds
    #[display("Response blocked by content policy: {}", _0)]
    PolicyBlocked(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Network-level failure before a response arrived
    #[display("Request failed: {}", _0)]
    Transport(String),
    /// Response body could not be decoded
    #[display("Failed to parse provider response: {}", _0)]
    ResponseParse(String),
    /// Token counting failed
    #[display("Token counting failed: {}", _0)]
    TokenCounting(String),
    /// Request body could not be assembled
    #[display("Failed to build request: {}", _0)]
    Builder(String),
}

impl ProviderErrorKind {
    /// Check if this error type should be retried.
    ///
    /// Quota exhaustion, empty responses, network failures and server-side
    /// statuses are transient. Policy blocks and client errors reproduce
    /// identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::RateLimitExceeded(_)
            | ProviderErrorKind::EmptyResponse(_)
            | ProviderErrorKind::Transport(_)
            | ProviderErrorKind::ResponseParse(_) => true,
            ProviderErrorKind::Http { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500..=599)
            }
            _ => false,
        }
    }

    /// Whether the provider told us we are over quota.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            ProviderErrorKind::RateLimitExceeded(_) => true,
            ProviderErrorKind::Http { status_code, .. } => *status_code == 429,
            _ => false,
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use redraft_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::MissingApiKey("gemini".to_string()));
/// assert!(format!("{}", err).contains("gemini"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use redraft_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let blocked = ProviderError::new(ProviderErrorKind::PolicyBlocked("SAFETY".to_string()));
/// assert!(!blocked.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger another attempt.
    fn is_retryable(&self) -> bool;

    /// Returns true if the failure was a quota signal from the provider.
    ///
    /// These are retried on the same schedule but logged distinctly.
    fn is_rate_limit(&self) -> bool {
        false
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn is_rate_limit(&self) -> bool {
        self.kind.is_rate_limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds_are_retryable() {
        assert!(ProviderErrorKind::RateLimitExceeded("quota".into()).is_retryable());
        assert!(ProviderErrorKind::EmptyResponse("STOP".into()).is_retryable());
        assert!(ProviderErrorKind::Transport("reset".into()).is_retryable());
        for status_code in [408, 429, 500, 502, 503, 504] {
            let kind = ProviderErrorKind::Http {
                status_code,
                message: String::new(),
            };
            assert!(kind.is_retryable(), "{status_code} should retry");
        }
    }

    #[test]
    fn test_permanent_kinds_are_not_retryable() {
        assert!(!ProviderErrorKind::PolicyBlocked("SAFETY".into()).is_retryable());
        assert!(!ProviderErrorKind::MissingApiKey("openai".into()).is_retryable());
        for status_code in [400, 401, 403, 404] {
            let kind = ProviderErrorKind::Http {
                status_code,
                message: String::new(),
            };
            assert!(!kind.is_retryable(), "{status_code} should not retry");
        }
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(ProviderErrorKind::RateLimitExceeded("quota".into()).is_rate_limit());
        assert!(
            ProviderErrorKind::Http {
                status_code: 429,
                message: "Too Many Requests".into()
            }
            .is_rate_limit()
        );
        assert!(!ProviderErrorKind::Transport("timeout".into()).is_rate_limit());
    }
}
