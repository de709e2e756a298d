//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `ProviderAdapter` trait that all providers implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete provider implementations (Yahoo, Finnhub, Alpha Vantage, Stooq)
//!
//! # Architecture
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: The aggregator doesn't know about specific providers
//! - **Extensible**: New providers can be added by implementing `ProviderAdapter`
//! - **Resilient**: Adapter errors are classified and never escape the
//!   aggregator; rate limiting protects upstream quotas
//!
//! Adapters translate vendor payloads into the crate's models and map vendor
//! failures onto [`MarketError`](crate::errors::MarketError). They perform no
//! caching, no retries and no fallback themselves.

use std::sync::Arc;

use log::warn;

use crate::config::MarketDataConfig;

mod capabilities;
mod traits;

// Provider implementations
pub mod alpha_vantage;
pub mod finnhub;
pub mod stooq;
pub mod yahoo;

// Re-exports
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use traits::ProviderAdapter;

/// Upper bound on symbol search results, across all providers.
pub const SEARCH_LIMIT: usize = 10;

/// Whether an API key is worth sending upstream. Empty strings and the
/// placeholder values people paste from vendor docs do not count.
pub(crate) fn has_usable_key(key: Option<&str>) -> bool {
    match key {
        Some(key) => {
            let trimmed = key.trim();
            !trimmed.is_empty()
                && !trimmed.eq_ignore_ascii_case("demo")
                && !trimmed.eq_ignore_ascii_case("YOUR_API_KEY")
        }
        None => false,
    }
}

/// Builds the default adapter set from configuration.
///
/// Every known adapter is constructed and then filtered against the
/// per-provider `enabled` flag. Settings are looked up by the same ids the
/// adapters report from [`ProviderAdapter::id`].
pub fn build_adapters(config: &MarketDataConfig) -> Vec<Arc<dyn ProviderAdapter>> {
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    match yahoo::YahooAdapter::new() {
        Ok(adapter) => adapters.push(Arc::new(adapter)),
        Err(e) => warn!("Yahoo adapter unavailable: {}", e),
    }

    let finnhub = config.provider("FINNHUB");
    adapters.push(Arc::new(finnhub::FinnhubAdapter::new(
        finnhub.api_key.clone(),
        finnhub.timeout,
    )));

    let alpha_vantage = config.provider("ALPHA_VANTAGE");
    adapters.push(Arc::new(alpha_vantage::AlphaVantageAdapter::new(
        alpha_vantage.api_key.clone(),
        alpha_vantage.timeout,
    )));

    let stooq = config.provider("STOOQ");
    adapters.push(Arc::new(stooq::StooqAdapter::new(stooq.timeout)));

    adapters.retain(|adapter| config.provider_enabled(adapter.id()));
    adapters
}
