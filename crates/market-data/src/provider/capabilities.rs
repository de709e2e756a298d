//! Provider capabilities and rate limiting configuration.
//!
//! This module defines structures for describing what a market data provider
//! can do and how aggressively it may be called.

/// Describes the capabilities of a market data provider.
///
/// Used by the aggregator to decide which providers to ask for a given
/// operation. A provider that cannot answer is passed over without charging
/// its rate budget or counting as an attempt.
#[derive(Clone, Copy, Debug)]
pub struct ProviderCapabilities {
    /// Whether the provider serves live quotes.
    pub supports_quote: bool,

    /// Whether the provider serves historical candles.
    pub supports_candles: bool,

    /// Whether the provider supports symbol search.
    pub supports_search: bool,
}

impl ProviderCapabilities {
    /// Quotes, candles and search.
    pub const fn full() -> Self {
        Self {
            supports_quote: true,
            supports_candles: true,
            supports_search: true,
        }
    }

    /// Quotes and candles, no search.
    pub const fn prices_only() -> Self {
        Self {
            supports_quote: true,
            supports_candles: true,
            supports_search: false,
        }
    }
}

/// Rate limiting budget for a provider.
///
/// Controls how aggressively we can call a provider to avoid hitting their
/// limits and getting blocked. Enforced locally by the aggregator's token
/// buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Sustained budget. The bucket refills at this rate.
    pub requests_per_minute: u32,

    /// Bucket capacity: how many calls may burst before refill matters.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}
