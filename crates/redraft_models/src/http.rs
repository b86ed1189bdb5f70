//! Mapping of HTTP-level failures onto provider error kinds.

use redraft_error::{ProviderError, ProviderErrorKind};
use tracing::error;

/// Network failure before any response arrived.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    error!(error = ?e, "Provider request failed");
    ProviderError::new(ProviderErrorKind::Transport(e.to_string()))
}

/// Response body that did not match the expected shape.
pub(crate) fn parse_error(e: impl std::fmt::Display) -> ProviderError {
    error!(error = %e, "Failed to parse provider response");
    ProviderError::new(ProviderErrorKind::ResponseParse(e.to_string()))
}

/// Turn a non-success response into an error, consuming the body.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    error!(status, body = %body, "Provider returned error status");
    classify_status(status, &body)
}

/// Classify an error status and body.
///
/// Quota exhaustion shows up either as HTTP 429 or as a Google
/// `RESOURCE_EXHAUSTED` status in the body.
pub(crate) fn classify_status(status: u16, body: &str) -> ProviderError {
    let message = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        ProviderError::new(ProviderErrorKind::RateLimitExceeded(message))
    } else {
        ProviderError::new(ProviderErrorKind::Http {
            status_code: status,
            message,
        })
    }
}

/// `error.message` from a JSON error envelope, which both vendors use.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
