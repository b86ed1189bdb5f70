//! Rate limiting, retry policy and configuration.
//!
//! One [`RateLimiter`] is shared by every call made to a provider during a
//! run; [`RetryPolicy`] decides how failed calls are retried; and
//! [`RedraftConfig`] carries the limits for each provider together with
//! the global defaults.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod retry;

pub use config::{Defaults, ProviderLimits, RedraftConfig};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use retry::{Resolution, RetryPolicy, RetryStep};
