//! # Token Bucket Rate Limiter
//!
//! Bounds the rate of outbound lookups. The bucket holds at most `burst`
//! tokens and refills continuously at `rate` tokens per second. `allow()`
//! takes one token when available and otherwise answers `false` at once; it
//! never sleeps, so the fetch worker can drop a request instead of queueing it.
//!
//! Time is read from `tokio::time::Instant`, which lets tests drive the bucket
//! with a paused clock.

use std::sync::{Mutex, PoisonError};
use tokio::time::Instant;

/// Default refill rate, in tokens per second.
pub const DEFAULT_RATE_PER_SEC: f64 = 10.0;
/// Default bucket capacity.
pub const DEFAULT_BURST: u32 = 1;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// # Rate Limiter
///
/// A non-blocking token bucket shared by reference. The bucket starts full.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Creates a limiter refilling at `rate_per_sec` with room for `burst` tokens.
    ///
    /// A non-positive rate never refills, and a zero burst denies every call.
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        let burst = f64::from(burst);
        Self {
            rate: rate_per_sec.max(0.0),
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Takes one token if one is available.
    pub fn allow(&self) -> bool {
        // The bucket is two plain numbers; a panic elsewhere cannot leave it torn.
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Bucket capacity.
    pub fn burst(&self) -> u32 {
        self.burst as u32
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_SEC, DEFAULT_BURST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_deny() {
        let limiter = RateLimiter::default();

        assert!(limiter.allow(), "a fresh bucket holds one token");
        assert!(!limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_at_rate() {
        let limiter = RateLimiter::new(10.0, 1);
        assert!(limiter.allow());

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!limiter.allow(), "half a token is not enough");

        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped_by_burst() {
        let limiter = RateLimiter::new(10.0, 3);
        for _ in 0..3 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());

        // A long idle period refills only up to the burst size.
        tokio::time::advance(Duration::from_secs(60)).await;
        let granted = (0..10).filter(|_| limiter.allow()).count();
        assert_eq!(granted, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_second_burst_is_bounded() {
        let limiter = RateLimiter::default();
        let mut granted = 0;

        // 100 attempts spread over one second.
        for _ in 0..100 {
            if limiter.allow() {
                granted += 1;
            }
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        assert!(granted <= 11, "granted {} tokens in one second", granted);
        assert!(granted >= 9);
    }

    #[test]
    fn test_zero_burst_denies() {
        let limiter = RateLimiter::new(100.0, 0);
        assert!(!limiter.allow());
        assert_eq!(limiter.burst(), 0);
    }
}
