//! Short-TTL memoization of aggregator results.
//!
//! Keys combine the operation kind, the normalized symbol and an md5 digest
//! of the remaining parameters, so a 5m series and a 1d series for the same
//! symbol never collide. Expired entries are evicted lazily by the lookup
//! that finds them; there is no background sweeper.
//!
//! Concurrent fetches for the same key may race on insert; last write wins,
//! which is acceptable because every entry is fresh within its TTL anyway.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

use crate::models::{CandleSeries, Quote, SymbolMatch};

/// Which aggregator operation produced a cache entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperationKind {
    Quote,
    Candles,
    Search,
}

/// Cache key: operation + normalized symbol + hashed parameters.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    op: OperationKind,
    symbol: String,
    params_hash: String,
}

impl CacheKey {
    /// Builds a key from the canonical parameter string for the call (for
    /// candles, e.g. `"5m:30"`). The string is hashed so keys stay small
    /// and uniform regardless of parameter shape.
    pub fn new(op: OperationKind, symbol: &str, params: &str) -> Self {
        Self {
            op,
            symbol: symbol.to_string(),
            params_hash: format!("{:x}", md5::compute(params)),
        }
    }
}

/// A cached aggregator result.
#[derive(Clone, Debug)]
pub enum CachedPayload {
    Quote(Quote),
    Candles(CandleSeries),
    Matches(Vec<SymbolMatch>),
}

struct CacheEntry {
    payload: CachedPayload,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// TTL cache for aggregator results.
pub struct QuoteCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    default_ttl: Duration,
}

impl QuoteCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the stored payload if present and younger than its TTL. An
    /// expired entry is removed on the spot.
    pub fn get(&self, key: &CacheKey) -> Option<CachedPayload> {
        let now = Instant::now();
        let mut entries = self.lock_entries();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.payload.clone()),
            Some(_) => {}
            None => return None,
        }

        entries.remove(key);
        None
    }

    /// Stores with the default TTL, overwriting any prior entry.
    pub fn put(&self, key: CacheKey, payload: CachedPayload) {
        self.put_with_ttl(key, payload, self.default_ttl);
    }

    /// Stores with an explicit TTL. Used for synthetic payloads, which
    /// expire quickly so real providers get retried soon.
    pub fn put_with_ttl(&self, key: CacheKey, payload: CachedPayload, ttl: Duration) {
        let entry = CacheEntry {
            payload,
            inserted_at: Instant::now(),
            ttl,
        };
        self.lock_entries().insert(key, entry);
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.lock_entries().len()
    }

    /// Ages an entry in place so expiry paths are testable without sleeping.
    #[cfg(test)]
    fn backdate(&self, key: &CacheKey, age: Duration) {
        if let Some(entry) = self.lock_entries().get_mut(key) {
            entry.inserted_at -= age;
        }
    }
}
