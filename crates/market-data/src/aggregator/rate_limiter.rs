//! Per-provider token buckets.
//!
//! Budgets come from each adapter's [`RateLimit`], with config overrides
//! already merged in by the aggregator. The check is non-blocking: a fetch
//! that finds an empty bucket passes over the provider for that call instead
//! of waiting, so a broadcast tick never stalls behind a refill.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use log::warn;

use crate::provider::RateLimit;

/// One provider's bucket. Tokens refill continuously from elapsed time.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens added per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(limit: RateLimit) -> Self {
        let capacity = f64::from(limit.burst.max(1));
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(limit.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token buckets for every provider in the chain. Buckets are created
/// lazily on first use.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    limits: HashMap<String, RateLimit>,
}

impl RateLimiter {
    /// `limits` maps provider id to its effective budget. Providers missing
    /// from the map fall back to [`RateLimit::default`].
    pub fn new(limits: HashMap<String, RateLimit>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limits,
        }
    }

    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn limit_for(&self, provider: &str) -> RateLimit {
        self.limits.get(provider).copied().unwrap_or_default()
    }

    /// Takes one token if the provider has budget left.
    pub fn try_acquire(&self, provider: &str) -> bool {
        let limit = self.limit_for(provider);
        let mut buckets = self.lock_buckets();
        buckets
            .entry(provider.to_string())
            .or_insert_with(|| TokenBucket::new(limit))
            .try_acquire(Instant::now())
    }

    /// Empties the provider's bucket. Applied when the upstream itself
    /// answered 429: local refill then gates the next attempts instead of
    /// hammering a throttled vendor.
    pub fn penalize(&self, provider: &str) {
        let limit = self.limit_for(provider);
        let mut buckets = self.lock_buckets();
        let bucket = buckets
            .entry(provider.to_string())
            .or_insert_with(|| TokenBucket::new(limit));
        bucket.refill(Instant::now());
        bucket.tokens = 0.0;
    }

    /// Ages a bucket in place so refill paths are testable without sleeping.
    #[cfg(test)]
    fn backdate(&self, provider: &str, age: std::time::Duration) {
        if let Some(bucket) = self.lock_buckets().get_mut(provider) {
            bucket.last_update -= age;
        }
    }
}
