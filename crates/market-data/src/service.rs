//! Service facade over the aggregator and the subscription registry.
//!
//! Hosts construct one [`MarketDataService`] and keep it for the process
//! lifetime. Request/response reads go straight to the aggregator;
//! streaming methods delegate to the registry.

use std::sync::Arc;

use log::info;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::aggregator::Aggregator;
use crate::config::MarketDataConfig;
use crate::errors::MarketError;
use crate::models::{CandleSeries, PriceUpdate, Quote, SymbolMatch, Timeframe, ViewerId};
use crate::provider::{build_adapters, ProviderAdapter};
use crate::stream::SubscriptionRegistry;

/// Entry point for everything this crate does.
pub struct MarketDataService {
    aggregator: Arc<Aggregator>,
    registry: SubscriptionRegistry,
}

impl MarketDataService {
    /// Builds the service with the default provider set.
    pub fn new(config: &MarketDataConfig) -> Self {
        Self::with_adapters(config, build_adapters(config))
    }

    /// Builds the service with an explicit adapter set. Used by hosts that
    /// wire their own providers, and by tests.
    pub fn with_adapters(
        config: &MarketDataConfig,
        adapters: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Self {
        let aggregator = Arc::new(Aggregator::new(config, adapters));
        info!(
            "Market data service starting, provider chain: {:?}",
            aggregator.provider_ids()
        );

        let registry = SubscriptionRegistry::new(Arc::clone(&aggregator), config.poll_interval);
        Self {
            aggregator,
            registry,
        }
    }

    /// Candle series for charting: the most recent `days` days at
    /// `timeframe`, newest rows kept when the series is capped.
    pub async fn get_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        days: u32,
    ) -> Result<CandleSeries, MarketError> {
        self.aggregator.get_candles(symbol, timeframe, days).await
    }

    /// Latest quote, with change and volume when the source provides them.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        self.aggregator.get_quote(symbol).await
    }

    /// Just the latest price, for order tickets and position marks.
    pub async fn get_current_price(&self, symbol: &str) -> Result<Decimal, MarketError> {
        Ok(self.aggregator.get_quote(symbol).await?.price)
    }

    /// Symbol lookup, at most ten matches.
    pub async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        self.aggregator.search(query).await
    }

    /// Registers a streaming viewer. The returned receiver yields a
    /// [`PriceUpdate`] per subscribed symbol per poll tick.
    pub fn connect(&self) -> (ViewerId, mpsc::Receiver<PriceUpdate>) {
        self.registry.connect()
    }

    /// Starts streaming `symbol` to the viewer.
    pub fn subscribe(&self, viewer: ViewerId, symbol: &str) {
        self.registry.subscribe(viewer, symbol);
    }

    /// Stops streaming `symbol` to the viewer.
    pub fn unsubscribe(&self, viewer: ViewerId, symbol: &str) {
        self.registry.unsubscribe(viewer, symbol);
    }

    /// Drops the viewer and every subscription it held.
    pub fn disconnect(&self, viewer: ViewerId) {
        self.registry.disconnect(viewer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::models::{Candle, DataSource};
    use crate::provider::ProviderCapabilities;

    struct StubAdapter;

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn id(&self) -> &'static str {
            "STUB"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::full()
        }

        async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
            Ok(Quote::new(
                symbol,
                dec!(101.25),
                Utc::now(),
                DataSource::provider("STUB"),
            ))
        }

        async fn candles(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<CandleSeries, MarketError> {
            let base = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap();
            let candles = (0..5)
                .map(|i| Candle {
                    symbol: symbol.to_string(),
                    timestamp: base + chrono::Duration::days(i),
                    open: dec!(100),
                    high: dec!(102),
                    low: dec!(99),
                    close: dec!(101),
                    volume: 10_000,
                })
                .collect();
            Ok(CandleSeries::new(
                symbol,
                timeframe,
                DataSource::provider("STUB"),
                candles,
            ))
        }

        async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
            Ok(vec![SymbolMatch::new(query, "Stub Corp", "NYSE")])
        }
    }

    fn service() -> MarketDataService {
        let config = MarketDataConfig::default().with_poll_interval(Duration::from_millis(25));
        MarketDataService::with_adapters(&config, vec![Arc::new(StubAdapter)])
    }

    #[tokio::test]
    async fn test_read_paths() {
        let service = service();

        let price = service.get_current_price("AAPL").await.unwrap();
        assert_eq!(price, dec!(101.25));

        let series = service.get_series("AAPL", Timeframe::D1, 30).await.unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.symbol, "AAPL");

        let matches = service.search("AAPL").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].exchange, "NYSE");
    }

    #[tokio::test]
    async fn test_streaming_path() {
        let service = service();
        let (viewer, mut rx) = service.connect();

        service.subscribe(viewer, "AAPL");
        let update = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("channel closed");

        assert_eq!(update.symbol, "AAPL");
        assert_eq!(update.price, dec!(101.25));

        service.disconnect(viewer);
    }
}
