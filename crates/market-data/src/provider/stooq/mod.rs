//! Stooq market data adapter.
//!
//! Stooq serves end-of-day data as CSV without any API key, which makes it
//! a useful last resort when the keyed providers are exhausted:
//! - Latest quotes via `/q/l/`
//! - Daily candles via `/q/d/l/`
//!
//! The service is daily-only. Intraday candle requests are declined so the
//! aggregator can move on instead of receiving mislabeled bars. There is no
//! symbol search.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use csv::ReaderBuilder;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::MarketError;
use crate::models::{Candle, CandleSeries, DataSource, Quote, Timeframe};
use crate::provider::{ProviderAdapter, ProviderCapabilities, RateLimit};

const BASE_URL: &str = "https://stooq.com";
const PROVIDER_ID: &str = "STOOQ";

/// Stooq answers quota violations with this text in a 200 body.
const HITS_LIMIT_MARKER: &str = "Exceeded the daily hits limit";

// ============================================================================
// CSV Row Structures
// ============================================================================

/// Row shape for `/q/l/?f=sd2t2ohlcv`. Unknown symbols come back with every
/// field set to "N/D" instead of an error status.
#[derive(Debug, Deserialize)]
struct LatestRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Volume")]
    volume: Option<String>,
}

/// Row shape for the `/q/d/l/` daily history download.
#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Volume")]
    volume: Option<String>,
}

// ============================================================================
// Stooq Adapter
// ============================================================================

/// Keyless end-of-day fallback provider.
pub struct StooqAdapter {
    client: Client,
}

impl StooqAdapter {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<String, MarketError> {
        debug!("Stooq request: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        check_body(&body)?;
        Ok(body)
    }
}

#[async_trait]
impl ProviderAdapter for StooqAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        4
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::prices_only()
    }

    fn rate_limit(&self) -> RateLimit {
        // Unpublished cap. Stooq blocks aggressive callers for the day, so
        // stay well below anything that could trip it.
        RateLimit {
            requests_per_minute: 30,
            burst: 5,
        }
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        debug!("Fetching latest quote for {} from Stooq", symbol);

        let url = format!(
            "{}/q/l/?s={}&f=sd2t2ohlcv&h&e=csv",
            BASE_URL,
            wire_symbol(symbol)
        );
        let body = self.fetch(&url).await?;
        let rows: Vec<LatestRow> = parse_rows(&body);

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))?;
        quote_from_row(symbol, row)
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, MarketError> {
        if timeframe.is_intraday() {
            debug!(
                "Stooq serves daily bars only; declining {} request for {}",
                timeframe, symbol
            );
            return Err(MarketError::Unavailable {
                provider: PROVIDER_ID.to_string(),
            });
        }

        debug!(
            "Fetching daily candles for {} from Stooq ({} to {})",
            symbol, start, end
        );

        let url = format!(
            "{}/q/d/l/?s={}&d1={}&d2={}&i=d",
            BASE_URL,
            wire_symbol(symbol),
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        );
        let body = self.fetch(&url).await?;

        let candles: Vec<Candle> = parse_rows::<HistoryRow>(&body)
            .into_iter()
            .filter_map(|row| candle_from_row(symbol, row))
            .collect();

        if candles.is_empty() {
            return Err(MarketError::EmptyRange);
        }

        Ok(CandleSeries::new(
            symbol,
            Timeframe::D1,
            DataSource::provider(PROVIDER_ID),
            candles,
        ))
    }

    // Stooq has no search endpoint; the trait's default empty answer stands.
}

// ============================================================================
// Response Mapping
// ============================================================================

/// Converts a symbol to Stooq's wire form: lowercase, with a `.us` venue
/// suffix appended when the symbol carries none.
fn wire_symbol(symbol: &str) -> String {
    let lower = symbol.to_lowercase();
    if lower.contains('.') {
        lower
    } else {
        format!("{}.us", lower)
    }
}

fn check_body(body: &str) -> Result<(), MarketError> {
    if body.contains(HITS_LIMIT_MARKER) {
        return Err(MarketError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        });
    }
    Ok(())
}

/// Deserializes CSV rows, skipping ones that do not fit. A "No data" body
/// has no records at all and simply yields an empty vec.
fn parse_rows<T: DeserializeOwned>(body: &str) -> Vec<T> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Stooq: skipping malformed CSV row: {}", e),
        }
    }
    rows
}

fn quote_from_row(symbol: &str, row: LatestRow) -> Result<Quote, MarketError> {
    let price = parse_price(&row.close)
        .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))?;

    let timestamp = parse_quote_timestamp(&row.date, &row.time).unwrap_or_else(Utc::now);
    let mut quote = Quote::new(symbol, price, timestamp, DataSource::provider(PROVIDER_ID));

    if let Some(volume) = row.volume.as_deref().and_then(|v| v.parse::<u64>().ok()) {
        quote = quote.with_volume(volume);
    }

    Ok(quote)
}

fn candle_from_row(symbol: &str, row: HistoryRow) -> Option<Candle> {
    let timestamp = parse_date(&row.date)?;
    Some(Candle {
        symbol: symbol.to_string(),
        timestamp,
        open: parse_price(&row.open)?,
        high: parse_price(&row.high)?,
        low: parse_price(&row.low)?,
        close: parse_price(&row.close)?,
        volume: row
            .volume
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
    })
}

/// Parses a CSV price cell, treating Stooq's "N/D" placeholder as absent.
fn parse_price(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "N/D" {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
}

fn parse_quote_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap_or(NaiveTime::MIN);
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_metadata() {
        let adapter = StooqAdapter::new(Duration::from_secs(10));
        assert_eq!(adapter.id(), "STOOQ");
        assert_eq!(adapter.priority(), 4);
        assert!(adapter.is_available());

        let caps = adapter.capabilities();
        assert!(caps.supports_quote && caps.supports_candles);
        assert!(!caps.supports_search);
    }

    #[test]
    fn test_wire_symbol() {
        assert_eq!(wire_symbol("AAPL"), "aapl.us");
        assert_eq!(wire_symbol("spy"), "spy.us");
        assert_eq!(wire_symbol("BMW.DE"), "bmw.de");
    }

    #[test]
    fn test_latest_quote_parses() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    AAPL.US,2024-01-03,22:00:11,184.22,185.88,183.43,184.25,58414460\n";
        let rows: Vec<LatestRow> = parse_rows(body);
        let quote = quote_from_row("AAPL", rows.into_iter().next().unwrap()).unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, dec!(184.25));
        assert_eq!(quote.volume, Some(58_414_460));
        assert_eq!(quote.source, DataSource::provider("STOOQ"));
        assert_eq!(quote.timestamp.timestamp(), 1_704_319_211);
    }

    #[test]
    fn test_unknown_symbol_row_is_not_found() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    ZZZZ.US,N/D,N/D,N/D,N/D,N/D,N/D,N/D\n";
        let rows: Vec<LatestRow> = parse_rows(body);
        let result = quote_from_row("ZZZZ", rows.into_iter().next().unwrap());

        assert!(matches!(result, Err(MarketError::SymbolNotFound(s)) if s == "ZZZZ"));
    }

    #[test]
    fn test_history_parses() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-02,187.15,188.44,183.89,185.64,82488674\n\
                    2024-01-03,184.22,185.88,183.43,184.25,58414460\n";
        let candles: Vec<Candle> = parse_rows::<HistoryRow>(body)
            .into_iter()
            .filter_map(|row| candle_from_row("AAPL", row))
            .collect();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, dec!(185.64));
        assert_eq!(candles[1].high, dec!(185.88));
        assert!(candles[0].timestamp < candles[1].timestamp);
    }

    #[test]
    fn test_no_data_body_yields_no_rows() {
        let rows: Vec<HistoryRow> = parse_rows("No data\n");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_hits_limit_maps_to_rate_limited() {
        let result = check_body("Exceeded the daily hits limit");
        assert!(matches!(result, Err(MarketError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_intraday_request_is_declined() {
        let adapter = StooqAdapter::new(Duration::from_secs(10));
        let end = Utc::now();
        let start = end - chrono::Duration::days(5);
        let result = adapter.candles("AAPL", Timeframe::M5, start, end).await;

        assert!(matches!(result, Err(MarketError::Unavailable { .. })));
    }
}
