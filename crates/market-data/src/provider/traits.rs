//! Provider adapter trait definition.
//!
//! This module defines the core `ProviderAdapter` trait that all
//! upstream market data sources must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::MarketError;
use crate::models::{CandleSeries, Quote, SymbolMatch, Timeframe};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// A uniform wrapper around one upstream market data source.
///
/// Implementations are stateless request translators: they map the crate's
/// operations onto one vendor's API and the vendor's quirks onto
/// [`MarketError`]. Ordering, caching, rate budgets, timeouts and fallback
/// all live in the aggregator, never in an adapter.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use papertrade_market_data::provider::{ProviderAdapter, ProviderCapabilities, RateLimit};
///
/// struct MyAdapter {
///     api_key: Option<String>,
/// }
///
/// #[async_trait]
/// impl ProviderAdapter for MyAdapter {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::prices_only()
///     }
///
///     fn is_available(&self) -> bool {
///         self.api_key.is_some()
///     }
///
///     // ... implement quote and candles
/// }
/// ```
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique identifier for this adapter.
    ///
    /// A constant uppercase string like "YAHOO" or "ALPHA_VANTAGE". Used for
    /// logging, rate limiter bookkeeping and config lookups.
    fn id(&self) -> &'static str;

    /// Default priority rank for chain ordering.
    ///
    /// Lower values try first. Default is 10. Configuration may override
    /// this per provider.
    fn priority(&self) -> u8 {
        10
    }

    /// Which operations this adapter can answer.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Default request budget. Configuration may override this per provider.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Cheap availability check: credential present and not a placeholder.
    ///
    /// Must never issue a network call; the aggregator consults it on every
    /// fetch to pass over unconfigured providers. Keyless adapters keep the
    /// default.
    fn is_available(&self) -> bool {
        true
    }

    /// Latest price for one symbol.
    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError>;

    /// Historical candles for a symbol over `[start, end]`.
    ///
    /// Returned bars are ascending with one bar per timestamp. A daily-only
    /// adapter may answer an intraday request with daily bars, but the
    /// series' `timeframe` must say what was actually delivered.
    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, MarketError>;

    /// Search for symbols matching the query.
    ///
    /// An empty vector is a valid answer, not an error. The default
    /// implementation finds nothing, for adapters without search support.
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        let _ = query;
        Ok(Vec::new())
    }
}
