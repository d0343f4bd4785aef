//! Token bucket rate limiter for upstream HTTP requests.
//!
//! Each networked source gets its own bucket and every request takes one
//! token, so an auction scan over several pages pays for each page. A bulk
//! refresh walks the whole tracked set one item at a time, so the bucket
//! mostly matters there: it spreads the upstream calls out instead of
//! bursting into a 429.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::SourceId;
use crate::provider::RateLimit;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn from_limit(limit: &RateLimit) -> Self {
        let capacity = f64::from(limit.burst.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Per-source token buckets, shared by the feeds of one upstream.
///
/// Buckets are created lazily from the limit registered with
/// [`configure`](Self::configure), or [`RateLimit::default`] otherwise.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    limits: Mutex<HashMap<String, RateLimit>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limits: Mutex::new(HashMap::new()),
        }
    }

    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_limits(&self) -> MutexGuard<'_, HashMap<String, RateLimit>> {
        self.limits.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter limits mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register the limit for a source, discarding any existing bucket.
    pub fn configure(&self, source: &SourceId, limit: RateLimit) {
        self.lock_limits().insert(source.to_string(), limit);
        self.lock_buckets().remove(source.as_ref());
    }

    /// Wait until the source has a token, then take it.
    pub async fn acquire(&self, source: &SourceId) {
        loop {
            let wait = {
                let mut buckets = self.lock_buckets();
                let bucket = buckets
                    .entry(source.to_string())
                    .or_insert_with(|| self.create_bucket(source));

                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait > Duration::ZERO {
                debug!("Rate limiter: waiting {:?} for '{}'", wait, source);
                tokio::time::sleep(wait).await;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn remaining_tokens(&self, source: &SourceId) -> f64 {
        let mut buckets = self.lock_buckets();
        match buckets.get_mut(source.as_ref()) {
            Some(bucket) => {
                bucket.refill();
                bucket.tokens
            }
            None => f64::from(self.limit_for(source).burst.max(1)),
        }
    }

    fn limit_for(&self, source: &SourceId) -> RateLimit {
        self.lock_limits()
            .get(source.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn create_bucket(&self, source: &SourceId) -> TokenBucket {
        TokenBucket::from_limit(&self.limit_for(source))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_bucket_drains_to_burst() {
        let mut bucket = TokenBucket::from_limit(&RateLimit::default());
        for _ in 0..10 {
            assert!(bucket.try_acquire());
        }
        assert!(!bucket.try_acquire());
    }

    #[test]
    fn test_bucket_refills_over_time() {
        let mut bucket = TokenBucket::from_limit(&RateLimit {
            requests_per_minute: 60,
            burst: 1,
        });
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());

        bucket.last_update = Instant::now() - Duration::from_secs(2);
        assert!(bucket.try_acquire());
    }

    #[tokio::test]
    async fn test_configured_burst_is_respected() {
        let limiter = RateLimiter::new();
        let source: SourceId = Cow::Borrowed("AUCTION");
        limiter.configure(
            &source,
            RateLimit {
                requests_per_minute: 30,
                burst: 5,
            },
        );

        assert!((limiter.remaining_tokens(&source) - 5.0).abs() < 0.01);
        for _ in 0..5 {
            limiter.acquire(&source).await;
        }
        assert!(limiter.remaining_tokens(&source) < 1.0);
    }

    #[tokio::test]
    async fn test_sources_are_isolated() {
        let limiter = RateLimiter::new();
        let auction: SourceId = Cow::Borrowed("AUCTION");
        let bazaar: SourceId = Cow::Borrowed("BAZAAR");

        for _ in 0..10 {
            limiter.acquire(&auction).await;
        }
        assert!(limiter.remaining_tokens(&auction) < 1.0);
        assert!((limiter.remaining_tokens(&bazaar) - 10.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_reconfigure_discards_bucket() {
        let limiter = RateLimiter::new();
        let source: SourceId = Cow::Borrowed("AUCTION");
        limiter.acquire(&source).await;
        limiter.acquire(&source).await;

        limiter.configure(
            &source,
            RateLimit {
                requests_per_minute: 30,
                burst: 3,
            },
        );
        assert!((limiter.remaining_tokens(&source) - 3.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new();
        let source: SourceId = Cow::Borrowed("BAZAAR");
        limiter.configure(
            &source,
            RateLimit {
                requests_per_minute: 6000,
                burst: 2,
            },
        );

        limiter.acquire(&source).await;
        limiter.acquire(&source).await;

        let start = Instant::now();
        limiter.acquire(&source).await;
        assert!(start.elapsed().as_millis() >= 5);
    }
}
