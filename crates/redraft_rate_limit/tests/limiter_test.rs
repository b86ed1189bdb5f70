//! Timing behaviour of the rate limiter under a paused clock.

use redraft_rate_limit::{ProviderLimits, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_granted_calls_respect_rpm_interval() {
    // 30 rpm = one call every 2 seconds; bucket large enough to never bind
    let limiter = RateLimiter::new(30, 10_000_000);
    let mut granted = Vec::new();
    for _ in 0..5 {
        limiter.wait(100).await;
        granted.push(Instant::now());
    }
    for pair in granted.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(2));
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_call_is_not_delayed() {
    let limiter = RateLimiter::new(1, 1_000);
    let start = Instant::now();
    limiter.wait(500).await;
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn test_tpm_wait_covers_deficit() {
    // 6000 tpm refills 100 tokens per second
    let limiter = RateLimiter::new(0, 6_000);
    let start = Instant::now();
    limiter.wait(6_000).await;
    assert_eq!(Instant::now(), start);

    limiter.wait(1_000).await;
    let waited = Instant::now() - start;
    assert!(waited >= Duration::from_secs(10), "waited {:?}", waited);
    assert!(waited < Duration::from_secs(11), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_tokens_stay_within_bounds() {
    let limiter = RateLimiter::new(0, 1_000);
    let requests = [300, 900, 1_000, 50, 5_000, 0, 999];
    for tokens in requests {
        limiter.wait(tokens).await;
        let level = limiter.tokens_available().await;
        assert!((0.0..=limiter.capacity()).contains(&level), "level {level}");
        tokio::time::advance(Duration::from_millis(1_500)).await;
        let level = limiter.tokens_available().await;
        assert!((0.0..=limiter.capacity()).contains(&level), "level {level}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_oversized_request_drains_full_bucket() {
    let limiter = RateLimiter::new(0, 600);
    limiter.wait(500).await;

    // Larger than capacity: waits for a full bucket, then empties it
    let start = Instant::now();
    limiter.wait(10_000).await;
    let waited = Instant::now() - start;
    assert!(waited >= Duration::from_secs(49), "waited {:?}", waited);
    assert!(limiter.tokens_available().await < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_serialize() {
    let limiter = Arc::new(RateLimiter::new(60, 0));
    let start = Instant::now();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                limiter.wait(1).await;
                Instant::now()
            })
        })
        .collect();

    let mut granted = Vec::new();
    for handle in handles {
        granted.push(handle.await.unwrap());
    }
    granted.sort();
    for pair in granted.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(1));
    }
    assert!(*granted.last().unwrap() - start >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_from_limits_uses_configured_values() {
    let limits = ProviderLimits {
        rpm: 12,
        tpm: 120_000,
        ..ProviderLimits::default()
    };
    let limiter = RateLimiter::from_limits(&limits);
    assert_eq!(limiter.min_interval(), Duration::from_secs(5));
    assert_eq!(limiter.capacity(), 120_000.0);
}
