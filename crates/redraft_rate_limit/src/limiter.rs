//! Rate limiter shared by every call to one provider.
//!
//! This module provides the `RateLimiter` struct which enforces:
//! - A minimum interval between granted calls (requests per minute)
//! - A token bucket refilled continuously at `capacity / 60` per second
//!   (tokens per minute)
//! - An optional daily request quota, via governor
//! - A cap on concurrent calls, via a Tokio Semaphore
//!
//! Time comes from `tokio::time::Instant`, so the limiter follows the
//! runtime's monotonic clock (and paused test clocks).

use crate::ProviderLimits;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const SECONDS_PER_DAY: u64 = 86_400;

/// Mutable limiter state, touched only while the critical section is held.
#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    last_call: Option<Instant>,
}

impl BucketState {
    fn refill(&mut self, now: Instant, capacity: f64, rate_per_second: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate_per_second).min(capacity);
        self.last_refill = now;
    }
}

/// Requests-per-minute and tokens-per-minute ceiling against one quota.
///
/// The whole enforce-then-deduct sequence of [`RateLimiter::wait`] runs
/// under one async mutex, so concurrent callers are granted one at a time.
///
/// # Example
///
/// ```rust,ignore
/// use redraft_rate_limit::{ProviderLimits, RateLimiter};
///
/// let limiter = RateLimiter::from_limits(&ProviderLimits::default());
///
/// // Reserve budget for a request estimated at 4000 tokens
/// let guard = limiter.acquire(4000).await;
/// // Make API call...
/// drop(guard); // Releases the concurrent slot
/// ```
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate_per_second: f64,
    min_interval: Duration,
    daily: Option<Arc<DirectRateLimiter>>,
    concurrency: Arc<Semaphore>,
}

impl RateLimiter {
    /// Create a limiter with the bucket full.
    ///
    /// `rpm = 0` disables the interval gate; `tpm = 0` disables the bucket.
    pub fn new(rpm: u32, tpm: u64) -> Self {
        let capacity = tpm as f64;
        let min_interval = if rpm > 0 {
            Duration::from_secs_f64(60.0 / f64::from(rpm))
        } else {
            Duration::ZERO
        };
        debug!(rpm, tpm, interval_secs = min_interval.as_secs_f64(), "Creating rate limiter");

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
                last_call: None,
            }),
            capacity,
            refill_rate_per_second: capacity / 60.0,
            min_interval,
            daily: None,
            concurrency: Arc::new(Semaphore::new(1)),
        }
    }

    /// Build a limiter from a provider's configured limits.
    pub fn from_limits(limits: &ProviderLimits) -> Self {
        Self::new(limits.rpm, limits.tpm)
            .with_daily_limit(limits.rpd)
            .with_concurrent_calls(limits.concurrent_calls)
    }

    /// Enforce a requests-per-day quota. `None` or `0` leaves it off.
    pub fn with_daily_limit(mut self, rpd: Option<u32>) -> Self {
        self.daily = rpd.and_then(NonZeroU32::new).and_then(|per_day| {
            Quota::with_period(Duration::from_secs(SECONDS_PER_DAY) / per_day.get())
                .map(|quota| Arc::new(GovernorRateLimiter::direct(quota.allow_burst(per_day))))
        });
        self
    }

    /// Number of guards that may be held at once (at least one).
    pub fn with_concurrent_calls(mut self, concurrent_calls: u32) -> Self {
        self.concurrency = Arc::new(Semaphore::new(concurrent_calls.max(1) as usize));
        self
    }

    /// Bucket capacity in tokens.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Minimum spacing between granted calls.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Current bucket level after lazy refill.
    pub async fn tokens_available(&self) -> f64 {
        let mut state = self.state.lock().await;
        if self.capacity > 0.0 {
            state.refill(Instant::now(), self.capacity, self.refill_rate_per_second);
        }
        state.tokens
    }

    /// Wait until `tokens_requested` may be spent and the call interval
    /// has elapsed, then deduct the tokens and record the call.
    ///
    /// Never fails. A request larger than the whole bucket waits for a
    /// full bucket and drains it.
    pub async fn wait(&self, tokens_requested: u64) {
        let mut state = self.state.lock().await;

        if let Some(last_call) = state.last_call {
            let since_last = Instant::now().saturating_duration_since(last_call);
            if since_last < self.min_interval {
                let pause = self.min_interval - since_last;
                info!(pause_secs = pause.as_secs_f64(), "RPM limit: pausing before next call");
                sleep(pause).await;
            }
        }

        if self.capacity > 0.0 {
            state.refill(Instant::now(), self.capacity, self.refill_rate_per_second);

            let requested = tokens_requested as f64;
            let needed = if requested > self.capacity {
                warn!(
                    tokens = tokens_requested,
                    capacity = self.capacity,
                    "Request exceeds TPM capacity; proceeding once the bucket is full"
                );
                self.capacity
            } else {
                requested
            };

            if needed > state.tokens {
                let deficit = needed - state.tokens;
                let pause = Duration::from_secs_f64(deficit / self.refill_rate_per_second);
                info!(
                    tokens = tokens_requested,
                    available = state.tokens,
                    pause_secs = pause.as_secs_f64(),
                    "TPM limit: waiting for bucket to refill"
                );
                sleep(pause).await;
                state.refill(Instant::now(), self.capacity, self.refill_rate_per_second);
            }

            state.tokens = (state.tokens - needed).max(0.0);
        }

        if let Some(daily) = &self.daily {
            daily.until_ready().await;
        }

        state.last_call = Some(Instant::now());
        debug!(tokens = tokens_requested, remaining = state.tokens, "Rate limit granted");
    }

    /// [`RateLimiter::wait`], then take a concurrency slot held until the
    /// returned guard drops.
    pub async fn acquire(&self, tokens_requested: u64) -> RateLimiterGuard {
        self.wait(tokens_requested).await;
        // The semaphore is never closed, so acquisition only waits.
        let permit = self.concurrency.clone().acquire_owned().await.ok();
        RateLimiterGuard { _permit: permit }
    }
}

/// RAII guard for a concurrency slot.
///
/// The slot returns to the semaphore when the guard drops, including on
/// early returns and panics.
#[derive(Debug)]
pub struct RateLimiterGuard {
    _permit: Option<OwnedSemaphorePermit>,
}
