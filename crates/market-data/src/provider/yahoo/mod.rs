//! Yahoo Finance market data adapter.
//!
//! Keyless and first in the default chain, backed by the
//! `yahoo_finance_api` crate:
//! - Latest quote: last bar of a 1d range query
//! - Candles: ranged history at the requested interval
//! - Search: ticker search endpoint
//!
//! Yahoo's interval vocabulary matches [`Timeframe::as_str`] exactly, so the
//! requested resolution is always the delivered one.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::errors::MarketError;
use crate::models::{Candle, CandleSeries, DataSource, Quote, SymbolMatch, Timeframe};
use crate::provider::{ProviderAdapter, ProviderCapabilities, RateLimit, SEARCH_LIMIT};

const PROVIDER_ID: &str = "YAHOO";

/// Yahoo Finance, the default primary provider.
pub struct YahooAdapter {
    connector: yahoo::YahooConnector,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, MarketError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to initialize Yahoo connector: {}", e),
        })?;
        Ok(Self { connector })
    }
}

#[async_trait]
impl ProviderAdapter for YahooAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full()
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 2000,
            burst: 20,
        }
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        debug!("Fetching latest quote for {} from Yahoo", symbol);

        let response = self
            .connector
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let bar = response
            .last_quote()
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let price = Decimal::from_f64(bar.close)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("Invalid close price for {}: {}", symbol, bar.close),
            })?;

        let timestamp = Utc
            .timestamp_opt(bar.timestamp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Ok(
            Quote::new(symbol, price, timestamp, DataSource::provider(PROVIDER_ID))
                .with_volume(bar.volume),
        )
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, MarketError> {
        debug!(
            "Fetching {} candles for {} from Yahoo ({} to {})",
            timeframe, symbol, start, end
        );

        let response = self
            .connector
            .get_quote_history_interval(
                symbol,
                chrono_to_offset(start),
                chrono_to_offset(end),
                timeframe.as_str(),
            )
            .await
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let bars = match response.quotes() {
            Ok(bars) => bars,
            Err(yahoo::YahooError::NoQuotes) | Err(yahoo::YahooError::NoResult) => {
                return Err(MarketError::EmptyRange);
            }
            Err(e) => return Err(map_yahoo_error(symbol, e)),
        };

        let mut candles = Vec::with_capacity(bars.len());
        for bar in &bars {
            match bar_to_candle(symbol, bar) {
                Some(candle) => candles.push(candle),
                None => warn!(
                    "Skipping malformed Yahoo bar for {} at ts {}",
                    symbol, bar.timestamp
                ),
            }
        }

        if candles.is_empty() {
            return Err(MarketError::EmptyRange);
        }

        Ok(CandleSeries::new(
            symbol,
            timeframe,
            DataSource::provider(PROVIDER_ID),
            candles,
        ))
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        debug!("Searching Yahoo for '{}'", query);

        let encoded = encode(query);
        let result =
            self.connector
                .search_ticker(&encoded)
                .await
                .map_err(|e| MarketError::Upstream {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Search failed: {}", e),
                })?;

        Ok(result
            .quotes
            .iter()
            .take(SEARCH_LIMIT)
            .map(|item| {
                SymbolMatch::new(
                    &item.symbol,
                    display_name(&item.long_name, &item.short_name, &item.symbol),
                    &item.exchange,
                )
            })
            .collect())
    }
}

/// Yahoo's not-found shapes collapse to `SymbolNotFound`; the rest is
/// upstream noise.
fn map_yahoo_error(symbol: &str, error: yahoo::YahooError) -> MarketError {
    match error {
        yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult => {
            MarketError::SymbolNotFound(symbol.to_string())
        }
        other => MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: other.to_string(),
        },
    }
}

fn chrono_to_offset(dt: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `None` for bars with unrepresentable or non-positive prices; Yahoo pads
/// some ranges with zeroed rows.
fn bar_to_candle(symbol: &str, bar: &yahoo::Quote) -> Option<Candle> {
    let close = Decimal::from_f64(bar.close).filter(|p| *p > Decimal::ZERO)?;
    Some(Candle {
        symbol: symbol.to_string(),
        timestamp: Utc.timestamp_opt(bar.timestamp as i64, 0).single()?,
        open: Decimal::from_f64(bar.open)?,
        high: Decimal::from_f64(bar.high)?,
        low: Decimal::from_f64(bar.low)?,
        close,
        volume: bar.volume,
    })
}

fn display_name(long_name: &str, short_name: &str, symbol: &str) -> String {
    let name = if !long_name.trim().is_empty() {
        long_name
    } else if !short_name.trim().is_empty() {
        short_name
    } else {
        symbol
    };
    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_bar() -> yahoo::Quote {
        yahoo::Quote {
            timestamp: 1_704_292_200,
            open: 184.22,
            high: 185.88,
            low: 183.43,
            volume: 58_414_460,
            close: 184.25,
            adjclose: 184.25,
        }
    }

    #[test]
    fn test_provider_metadata() {
        let adapter = YahooAdapter::new().unwrap();
        assert_eq!(adapter.id(), "YAHOO");
        assert_eq!(adapter.priority(), 1);
        assert!(adapter.is_available());
        assert!(adapter.capabilities().supports_search);
    }

    #[test]
    fn test_bar_converts_to_candle() {
        let candle = bar_to_candle("AAPL", &sample_bar()).unwrap();

        assert_eq!(candle.symbol, "AAPL");
        assert_eq!(candle.open, dec!(184.22));
        assert_eq!(candle.high, dec!(185.88));
        assert_eq!(candle.low, dec!(183.43));
        assert_eq!(candle.close, dec!(184.25));
        assert_eq!(candle.volume, 58_414_460);
        assert_eq!(candle.timestamp.timestamp(), 1_704_292_200);
    }

    #[test]
    fn test_malformed_bars_are_rejected() {
        let mut nan_bar = sample_bar();
        nan_bar.close = f64::NAN;
        assert!(bar_to_candle("AAPL", &nan_bar).is_none());

        let mut zero_bar = sample_bar();
        zero_bar.close = 0.0;
        assert!(bar_to_candle("AAPL", &zero_bar).is_none());
    }

    #[test]
    fn test_chrono_to_offset_preserves_instant() {
        let dt = Utc.timestamp_opt(1_704_292_200, 0).unwrap();
        assert_eq!(chrono_to_offset(dt).unix_timestamp(), 1_704_292_200);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name("Apple Inc.", "Apple", "AAPL"), "Apple Inc.");
        assert_eq!(display_name("", "Apple", "AAPL"), "Apple");
        assert_eq!(display_name("  ", "", "AAPL"), "AAPL");
    }

    #[test]
    fn test_not_found_mapping() {
        let error = map_yahoo_error("ZZZZ", yahoo::YahooError::NoQuotes);
        assert!(matches!(error, MarketError::SymbolNotFound(s) if s == "ZZZZ"));
    }
}
