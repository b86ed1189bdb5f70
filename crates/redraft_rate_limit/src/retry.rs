//! Retry schedule and the decision taken after each failed attempt.
//!
//! The policy itself never sleeps: callers drive their own loop over
//! [`RetryPolicy::next_step`], which keeps the schedule testable without
//! a runtime.

use derive_getters::Getters;
use redraft_error::RetryableError;
use std::time::Duration;
use tokio_retry2::strategy::ExponentialBackoff;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for the delay, then try again
    Retry(Duration),
    /// Surface the error to the caller
    GiveUp,
}

/// Bounded exponential back-off: `retry_attempts` retries after the first
/// attempt, waiting `retry_delay × 2^n` before retry `n` (0-based).
///
/// # Examples
///
/// ```
/// use redraft_rate_limit::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(20));
/// let delays: Vec<_> = policy.backoff().collect();
/// assert_eq!(delays, vec![
///     Duration::from_secs(20),
///     Duration::from_secs(40),
///     Duration::from_secs(80),
/// ]);
/// assert_eq!(policy.max_attempts(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    retry_attempts: u32,
    /// Base delay
    retry_delay: Duration,
}

/// Outcome of folding a sequence of attempt results through a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T, E> {
    /// Final result, `None` when no attempt was supplied
    pub outcome: Option<Result<T, E>>,
    /// Delays that would have been slept between attempts
    pub delays: Vec<Duration>,
    /// Attempts consumed from the input
    pub attempts: u32,
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(retry_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            retry_attempts,
            retry_delay,
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }

    /// The delays slept before each retry, in order.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> {
        // Base 2 yields 2f, 4f, 8f...; halving gives f, 2f, 4f exactly.
        let millis = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX / 2);
        ExponentialBackoff::from_millis(2)
            .factor(millis)
            .map(|delay| delay / 2)
            .take(self.retry_attempts as usize)
    }

    /// Decide what follows a failure, given the next scheduled delay
    /// (`None` once the schedule is exhausted).
    pub fn next_step<E: RetryableError>(&self, error: &E, next_delay: Option<Duration>) -> RetryStep {
        match next_delay {
            Some(delay) if error.is_retryable() => RetryStep::Retry(delay),
            _ => RetryStep::GiveUp,
        }
    }

    /// Fold attempt results through the policy without sleeping.
    ///
    /// Stops at the first success, at a non-retryable error, or when the
    /// schedule runs out, whichever comes first.
    pub fn resolve<T, E, I>(&self, attempt_results: I) -> Resolution<T, E>
    where
        E: RetryableError,
        I: IntoIterator<Item = Result<T, E>>,
    {
        let mut schedule = self.backoff();
        let mut delays = Vec::new();
        let mut attempts = 0;
        let mut last = None;

        for result in attempt_results {
            attempts += 1;
            match result {
                Ok(value) => {
                    last = Some(Ok(value));
                    break;
                }
                Err(error) => match self.next_step(&error, schedule.next()) {
                    RetryStep::Retry(delay) => {
                        delays.push(delay);
                        last = Some(Err(error));
                    }
                    RetryStep::GiveUp => {
                        last = Some(Err(error));
                        break;
                    }
                },
            }
        }

        Resolution {
            outcome: last,
            delays,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_error::{ProviderError, ProviderErrorKind};

    fn transient() -> ProviderError {
        ProviderError::new(ProviderErrorKind::Transport("connection reset".to_string()))
    }

    fn blocked() -> ProviderError {
        ProviderError::new(ProviderErrorKind::PolicyBlocked("SAFETY".to_string()))
    }

    #[test]
    fn test_zero_attempts_has_empty_schedule() {
        let policy = RetryPolicy::new(0, Duration::from_secs(5));
        assert_eq!(policy.backoff().count(), 0);
        assert_eq!(policy.next_step(&transient(), None), RetryStep::GiveUp);
    }

    #[test]
    fn test_sub_second_delays_double() {
        let policy = RetryPolicy::new(3, Duration::from_millis(250));
        let delays: Vec<_> = policy.backoff().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(1000)
            ]
        );
    }

    #[test]
    fn test_non_retryable_gives_up_immediately() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let step = policy.next_step(&blocked(), Some(Duration::from_secs(1)));
        assert_eq!(step, RetryStep::GiveUp);
    }

    #[test]
    fn test_resolve_bounded_by_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1));
        let results: Vec<Result<&str, ProviderError>> = (0..10).map(|_| Err(transient())).collect();
        let resolution = policy.resolve(results);
        assert_eq!(resolution.attempts, 3);
        assert_eq!(
            resolution.delays,
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(matches!(resolution.outcome, Some(Err(_))));
    }

    #[test]
    fn test_resolve_stops_at_success() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let results = vec![Err(transient()), Ok("text"), Err(transient())];
        let resolution = policy.resolve(results);
        assert_eq!(resolution.attempts, 2);
        assert_eq!(resolution.delays, vec![Duration::from_secs(2)]);
        assert!(matches!(resolution.outcome, Some(Ok("text"))));
    }

    #[test]
    fn test_resolve_stops_at_policy_block() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let results: Vec<Result<(), ProviderError>> = vec![Err(transient()), Err(blocked())];
        let resolution = policy.resolve(results);
        assert_eq!(resolution.attempts, 2);
        assert_eq!(resolution.delays.len(), 1);
    }
}
