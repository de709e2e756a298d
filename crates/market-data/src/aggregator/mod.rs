//! Provider aggregation: ordering, caching, rate budgets and fallback.
//!
//! The aggregator owns the provider chain and is the only component that
//! calls adapters. Every read follows the same path:
//!
//! 1. Cache lookup
//! 2. Providers in priority order, each behind a local rate budget and a
//!    per-call deadline
//! 3. Synthetic terminal fallback, so read paths stay total
//!
//! Adapter errors never escape: each one is classified into a
//! [`FallbackAction`] and handled inside the chain. The single exception is
//! a symbol every consulted provider rejected, which surfaces as
//! [`MarketError::SymbolNotFound`] so callers can tell a bad symbol apart
//! from an outage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};

use crate::cache::{CacheKey, CachedPayload, OperationKind, QuoteCache};
use crate::config::{MarketDataConfig, DEFAULT_CALL_TIMEOUT};
use crate::errors::{FallbackAction, MarketError};
use crate::models::{normalize_symbol, CandleSeries, Quote, SymbolMatch, Timeframe};
use crate::provider::{ProviderAdapter, SEARCH_LIMIT};
use crate::synthetic::SyntheticGenerator;

mod rate_limiter;

pub use rate_limiter::RateLimiter;

/// Hard cap on rows in a returned candle series.
const SERIES_ROW_CAP: usize = 500;

/// Synthetic results expire quickly so real providers get retried soon.
const SYNTHETIC_TTL: Duration = Duration::from_secs(15);

/// Orchestrates the provider chain behind a cache.
pub struct Aggregator {
    /// Chain order is fixed at construction: config priority overrides the
    /// adapter default, ties break on id for determinism.
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    cache: QuoteCache,
    rate_limiter: RateLimiter,
    synthetic: SyntheticGenerator,
    timeouts: HashMap<String, Duration>,
}

impl Aggregator {
    pub fn new(config: &MarketDataConfig, mut adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        adapters.sort_by_key(|adapter| {
            let settings = config.provider(adapter.id());
            (
                settings.priority.unwrap_or_else(|| adapter.priority()),
                adapter.id(),
            )
        });

        let mut limits = HashMap::new();
        let mut timeouts = HashMap::new();
        for adapter in &adapters {
            let settings = config.provider(adapter.id());
            limits.insert(
                adapter.id().to_string(),
                settings.rate_limit.unwrap_or_else(|| adapter.rate_limit()),
            );
            timeouts.insert(adapter.id().to_string(), settings.timeout);
        }

        Self {
            adapters,
            cache: QuoteCache::new(config.cache_ttl),
            rate_limiter: RateLimiter::new(limits),
            synthetic: SyntheticGenerator::default(),
            timeouts,
        }
    }

    /// Provider ids in chain order. Useful for logging at startup.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|adapter| adapter.id()).collect()
    }

    /// Latest price for a symbol.
    ///
    /// Served from cache when fresh, otherwise from the first provider in
    /// the chain that answers, otherwise synthesized.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        let symbol = normalize_symbol(symbol);
        let key = CacheKey::new(OperationKind::Quote, &symbol, "");

        if let Some(CachedPayload::Quote(quote)) = self.cache.get(&key) {
            debug!("Cache hit for quote {}", symbol);
            return Ok(quote);
        }

        let mut attempted = 0usize;
        let mut not_found = 0usize;

        for adapter in &self.adapters {
            if !adapter.capabilities().supports_quote {
                continue;
            }
            if !adapter.is_available() {
                debug!("Provider '{}' not configured, skipping", adapter.id());
                continue;
            }
            if !self.rate_limiter.try_acquire(adapter.id()) {
                debug!("Rate budget for '{}' exhausted, skipping", adapter.id());
                continue;
            }

            match self.bounded(adapter.id(), adapter.quote(&symbol)).await {
                Ok(quote) => {
                    debug!("Quote for {} served by '{}'", symbol, adapter.id());
                    self.cache.put(key, CachedPayload::Quote(quote.clone()));
                    return Ok(quote);
                }
                Err(e) => {
                    if self.handle_failure(
                        adapter.id(),
                        &symbol,
                        &e,
                        &mut attempted,
                        &mut not_found,
                    ) {
                        return Err(e);
                    }
                }
            }
        }

        if attempted > 0 && not_found == attempted {
            return Err(MarketError::SymbolNotFound(symbol));
        }

        debug!("No provider served a quote for {}, synthesizing", symbol);
        let quote = self.synthetic.quote(&symbol);
        self.cache
            .put_with_ttl(key, CachedPayload::Quote(quote.clone()), SYNTHETIC_TTL);
        Ok(quote)
    }

    /// Historical candles covering the last `days` days.
    ///
    /// The series is capped at [`SERIES_ROW_CAP`] rows, keeping the most
    /// recent bars.
    pub async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        days: u32,
    ) -> Result<CandleSeries, MarketError> {
        let symbol = normalize_symbol(symbol);
        let params = format!("{}:{}", timeframe, days);
        let key = CacheKey::new(OperationKind::Candles, &symbol, &params);

        if let Some(CachedPayload::Candles(series)) = self.cache.get(&key) {
            debug!("Cache hit for {} candles {}", timeframe, symbol);
            return Ok(series);
        }

        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(days));

        let mut attempted = 0usize;
        let mut not_found = 0usize;

        for adapter in &self.adapters {
            if !adapter.capabilities().supports_candles {
                continue;
            }
            if !adapter.is_available() {
                debug!("Provider '{}' not configured, skipping", adapter.id());
                continue;
            }
            if !self.rate_limiter.try_acquire(adapter.id()) {
                debug!("Rate budget for '{}' exhausted, skipping", adapter.id());
                continue;
            }

            match self
                .bounded(adapter.id(), adapter.candles(&symbol, timeframe, start, end))
                .await
            {
                // An empty success means the provider has nothing for the
                // range. Treated like EmptyRange rather than cached.
                Ok(series) if series.is_empty() => {
                    attempted += 1;
                    debug!("Provider '{}' returned no bars for {}", adapter.id(), symbol);
                }
                Ok(mut series) => {
                    clamp_rows(&mut series);
                    debug!(
                        "{} candles for {} served by '{}' ({} bars)",
                        timeframe,
                        symbol,
                        adapter.id(),
                        series.len()
                    );
                    self.cache.put(key, CachedPayload::Candles(series.clone()));
                    return Ok(series);
                }
                Err(e) => {
                    if self.handle_failure(
                        adapter.id(),
                        &symbol,
                        &e,
                        &mut attempted,
                        &mut not_found,
                    ) {
                        return Err(e);
                    }
                }
            }
        }

        if attempted > 0 && not_found == attempted {
            return Err(MarketError::SymbolNotFound(symbol));
        }

        debug!("No provider served candles for {}, synthesizing", symbol);
        let mut series = self
            .synthetic
            .daily_series(&symbol, days.min(SERIES_ROW_CAP as u32));
        clamp_rows(&mut series);
        self.cache
            .put_with_ttl(key, CachedPayload::Candles(series.clone()), SYNTHETIC_TTL);
        Ok(series)
    }

    /// Symbol search across providers that support it.
    ///
    /// The first non-empty answer wins, capped at [`SEARCH_LIMIT`] entries.
    /// An exhausted chain finds nothing rather than failing; empty results
    /// are not cached so a recovering provider is consulted again promptly.
    pub async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::new(OperationKind::Search, "", query);
        if let Some(CachedPayload::Matches(matches)) = self.cache.get(&key) {
            debug!("Cache hit for search '{}'", query);
            return Ok(matches);
        }

        for adapter in &self.adapters {
            if !adapter.capabilities().supports_search {
                continue;
            }
            if !adapter.is_available() {
                debug!("Provider '{}' not configured, skipping", adapter.id());
                continue;
            }
            if !self.rate_limiter.try_acquire(adapter.id()) {
                debug!("Rate budget for '{}' exhausted, skipping", adapter.id());
                continue;
            }

            match self.bounded(adapter.id(), adapter.search(query)).await {
                Ok(matches) if matches.is_empty() => {
                    debug!("Provider '{}' found nothing for '{}'", adapter.id(), query);
                }
                Ok(mut matches) => {
                    matches.truncate(SEARCH_LIMIT);
                    self.cache.put(key, CachedPayload::Matches(matches.clone()));
                    return Ok(matches);
                }
                Err(e) => match e.fallback_action() {
                    FallbackAction::Halt => return Err(e),
                    FallbackAction::Skip => {
                        debug!("Provider '{}' skipped: {}", adapter.id(), e);
                    }
                    _ => {
                        if matches!(e, MarketError::RateLimited { .. }) {
                            self.rate_limiter.penalize(adapter.id());
                        }
                        warn!("Provider '{}' search failed for '{}': {}", adapter.id(), query, e);
                    }
                },
            }
        }

        debug!("No provider produced matches for '{}'", query);
        Ok(Vec::new())
    }

    /// Applies the per-provider deadline to one adapter call.
    async fn bounded<T>(
        &self,
        provider: &str,
        fut: impl Future<Output = Result<T, MarketError>>,
    ) -> Result<T, MarketError> {
        let deadline = self
            .timeouts
            .get(provider)
            .copied()
            .unwrap_or(DEFAULT_CALL_TIMEOUT);

        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(MarketError::Timeout {
                provider: provider.to_string(),
            }),
        }
    }

    /// Common failure bookkeeping for the quote and candle chains. Returns
    /// true when the chain must stop and surface the error.
    fn handle_failure(
        &self,
        provider: &str,
        symbol: &str,
        error: &MarketError,
        attempted: &mut usize,
        not_found: &mut usize,
    ) -> bool {
        match error.fallback_action() {
            FallbackAction::Skip => {
                debug!("Provider '{}' skipped: {}", provider, error);
            }
            FallbackAction::Continue => {
                *attempted += 1;
                if matches!(error, MarketError::RateLimited { .. }) {
                    self.rate_limiter.penalize(provider);
                }
                warn!("Provider '{}' failed for {}: {}", provider, symbol, error);
            }
            FallbackAction::RecordAndContinue => {
                *attempted += 1;
                *not_found += 1;
                debug!("Provider '{}' does not know {}", provider, symbol);
            }
            FallbackAction::Halt => return true,
        }
        false
    }
}

/// Trims a series to the row cap, dropping the oldest bars.
fn clamp_rows(series: &mut CandleSeries) {
    let len = series.candles.len();
    if len > SERIES_ROW_CAP {
        series.candles.drain(..len - SERIES_ROW_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::config::ProviderSettings;
    use crate::models::{Candle, DataSource};
    use crate::provider::ProviderCapabilities;

    enum MockResponse {
        Price(Decimal),
        NotFound,
        Upstream,
        RateLimited,
        Slow(Duration, Decimal),
    }

    struct MockAdapter {
        id: &'static str,
        priority: u8,
        response: MockResponse,
        available: bool,
        bars: usize,
        calls: AtomicUsize,
    }

    impl MockAdapter {
        fn new(id: &'static str, priority: u8, response: MockResponse) -> Self {
            Self {
                id,
                priority,
                response,
                available: true,
                bars: 3,
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        fn with_bars(mut self, bars: usize) -> Self {
            self.bars = bars;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn series(&self, symbol: &str, price: Decimal) -> CandleSeries {
            let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
            let candles = (0..self.bars)
                .map(|i| Candle {
                    symbol: symbol.to_string(),
                    timestamp: start + chrono::Duration::days(i as i64),
                    open: price,
                    high: price + dec!(1),
                    low: price - dec!(1),
                    close: price,
                    volume: 1_000,
                })
                .collect();
            CandleSeries::new(
                symbol,
                Timeframe::D1,
                DataSource::provider(self.id),
                candles,
            )
        }

        fn failure(&self, symbol: &str) -> MarketError {
            match self.response {
                MockResponse::NotFound => MarketError::SymbolNotFound(symbol.to_string()),
                MockResponse::Upstream => MarketError::Upstream {
                    provider: self.id.to_string(),
                    message: "mock failure".to_string(),
                },
                MockResponse::RateLimited => MarketError::RateLimited {
                    provider: self.id.to_string(),
                },
                _ => unreachable!("not a failure response"),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::full()
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                MockResponse::Price(price) => Ok(Quote::new(
                    symbol,
                    *price,
                    Utc::now(),
                    DataSource::provider(self.id),
                )),
                MockResponse::Slow(delay, price) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Quote::new(
                        symbol,
                        *price,
                        Utc::now(),
                        DataSource::provider(self.id),
                    ))
                }
                _ => Err(self.failure(symbol)),
            }
        }

        async fn candles(
            &self,
            symbol: &str,
            _timeframe: Timeframe,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<CandleSeries, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                MockResponse::Price(price) => Ok(self.series(symbol, *price)),
                MockResponse::Slow(delay, price) => {
                    tokio::time::sleep(*delay).await;
                    Ok(self.series(symbol, *price))
                }
                _ => Err(self.failure(symbol)),
            }
        }

        async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                MockResponse::Price(_) => Ok((0..12)
                    .map(|i| {
                        SymbolMatch::new(format!("{}{}", query, i), "Mock Result", "US")
                    })
                    .collect()),
                MockResponse::NotFound => Ok(Vec::new()),
                _ => Err(self.failure(query)),
            }
        }
    }

    fn aggregator(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Aggregator {
        Aggregator::new(&MarketDataConfig::default(), adapters)
    }

    #[tokio::test]
    async fn test_first_provider_in_priority_order_wins() {
        let a = Arc::new(MockAdapter::new("A", 2, MockResponse::Price(dec!(1.00))));
        let b = Arc::new(MockAdapter::new("B", 1, MockResponse::Price(dec!(2.00))));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(2.00));
        assert_eq!(quote.source, DataSource::provider("B"));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_config_priority_overrides_adapter_default() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(1.00))));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(2.00))));
        let config = MarketDataConfig::default().with_provider(
            "B",
            ProviderSettings {
                priority: Some(0),
                ..Default::default()
            },
        );
        let agg = Aggregator::new(&config, vec![a.clone(), b.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(2.00));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_failures_fall_through_to_next_provider() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Upstream));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(150.00))));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(150.00));
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_never_called() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(1.00))).unavailable());
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(99.00))));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(99.00));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_unanimous_not_found_surfaces() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::NotFound));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::NotFound));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        let result = agg.get_quote("ZZZZ").await;

        assert!(matches!(result, Err(MarketError::SymbolNotFound(s)) if s == "ZZZZ"));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_mixed_failures_fall_back_to_synthetic() {
        // One provider is down, one says not found: not unanimous, so the
        // symbol may still exist and a synthetic quote is served.
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Upstream));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::NotFound));
        let agg = aggregator(vec![a, b]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert!(quote.source.is_synthetic());
        assert!(quote.price > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_empty_chain_serves_synthetic() {
        let agg = aggregator(Vec::new());

        let quote = agg.get_quote("AAPL").await.unwrap();
        assert!(quote.source.is_synthetic());

        let series = agg.get_candles("AAPL", Timeframe::D1, 30).await.unwrap();
        assert!(series.is_synthetic());
        assert!(!series.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_spares_providers() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(150.00))));
        let agg = aggregator(vec![a.clone()]);

        let first = agg.get_quote("AAPL").await.unwrap();
        let second = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(first.price, second.price);
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_refetch() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(150.00))));
        let config = MarketDataConfig::default().with_cache_ttl(Duration::from_millis(40));
        let agg = Aggregator::new(&config, vec![a.clone()]);

        agg.get_quote("AAPL").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        agg.get_quote("AAPL").await.unwrap();

        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn test_symbol_normalization_shares_cache_entries() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(150.00))));
        let agg = aggregator(vec![a.clone()]);

        agg.get_quote(" aapl ").await.unwrap();
        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_provider_is_benched() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::RateLimited));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(42.00))));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        // First fetch: A reports 429 and gets its local budget zeroed.
        agg.get_quote("AAPL").await.unwrap();
        // Different symbol, so the cache cannot answer. A must be skipped.
        agg.get_quote("MSFT").await.unwrap();

        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 2);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_and_chain_continues() {
        let slow = Arc::new(MockAdapter::new(
            "SLOW",
            1,
            MockResponse::Slow(Duration::from_millis(200), dec!(1.00)),
        ));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(99.00))));
        let config = MarketDataConfig::default().with_provider(
            "SLOW",
            ProviderSettings {
                timeout: Duration::from_millis(10),
                ..Default::default()
            },
        );
        let agg = Aggregator::new(&config, vec![slow.clone(), b.clone()]);

        let quote = agg.get_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(99.00));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_series_rows_are_capped_keeping_recent() {
        let a = Arc::new(
            MockAdapter::new("A", 1, MockResponse::Price(dec!(100.00))).with_bars(600),
        );
        let agg = aggregator(vec![a]);

        let series = agg.get_candles("AAPL", Timeframe::D1, 700).await.unwrap();

        assert_eq!(series.len(), SERIES_ROW_CAP);
        // The oldest hundred bars were dropped.
        let first = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
            + chrono::Duration::days(100);
        assert_eq!(series.candles[0].timestamp, first);
    }

    #[tokio::test]
    async fn test_candles_not_found_everywhere_surfaces() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::NotFound));
        let agg = aggregator(vec![a]);

        let result = agg.get_candles("ZZZZ", Timeframe::D1, 30).await;

        assert!(matches!(result, Err(MarketError::SymbolNotFound(_))));
    }

    #[tokio::test]
    async fn test_search_truncates_and_caches() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(1.00))));
        let agg = aggregator(vec![a.clone()]);

        let matches = agg.search("AP").await.unwrap();
        assert_eq!(matches.len(), SEARCH_LIMIT);

        agg.search("AP").await.unwrap();
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_blank_query_is_empty_without_calls() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Price(dec!(1.00))));
        let agg = aggregator(vec![a.clone()]);

        let matches = agg.search("   ").await.unwrap();

        assert!(matches.is_empty());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_falls_past_empty_answers() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::NotFound));
        let b = Arc::new(MockAdapter::new("B", 2, MockResponse::Price(dec!(1.00))));
        let agg = aggregator(vec![a.clone(), b.clone()]);

        let matches = agg.search("AAPL").await.unwrap();

        assert!(!matches.is_empty());
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_exhausted_chain_finds_nothing() {
        let a = Arc::new(MockAdapter::new("A", 1, MockResponse::Upstream));
        let agg = aggregator(vec![a]);

        let matches = agg.search("AAPL").await.unwrap();

        assert!(matches.is_empty());
    }
}
