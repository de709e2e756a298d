//! Alpha Vantage market data adapter.
//!
//! This module provides market data from the Alpha Vantage API:
//! - Latest quotes via GLOBAL_QUOTE
//! - Daily candles via TIME_SERIES_DAILY
//! - Intraday candles via TIME_SERIES_INTRADAY
//! - Symbol search via SYMBOL_SEARCH
//!
//! Alpha Vantage reports problems inside 200 responses: a "Note" or
//! "Information" field means the free-tier quota is spent, an
//! "Error Message" field usually means the symbol or call was invalid.
//! Those are mapped before any payload parsing happens.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketError;
use crate::models::{Candle, CandleSeries, DataSource, Quote, SymbolMatch, Timeframe};
use crate::provider::{
    has_usable_key, ProviderAdapter, ProviderCapabilities, RateLimit, SEARCH_LIMIT,
};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

// ============================================================================
// API Response Structures
// ============================================================================

/// Vendor notices embedded in otherwise-200 responses. Every endpoint can
/// carry these, so they are parsed before the typed payload.
#[derive(Debug, Default, Deserialize)]
struct ApiNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

/// Unknown symbols yield an empty object here, hence every field is optional.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

/// One bar from any TIME_SERIES_* map.
#[derive(Debug, Deserialize)]
struct SeriesBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

/// SYMBOL_SEARCH response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<BestMatch>,
}

#[derive(Debug, Deserialize)]
struct BestMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    /// Closest thing to an exchange the endpoint offers.
    #[serde(rename = "4. region")]
    region: String,
}

// ============================================================================
// Alpha Vantage Adapter
// ============================================================================

/// Alpha Vantage, the default third provider.
pub struct AlphaVantageAdapter {
    client: Client,
    api_key: Option<String>,
}

impl AlphaVantageAdapter {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Issues a GET and returns the body text. Vendor notices are checked by
    /// the caller since they arrive with status 200.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketError::Unavailable {
                provider: PROVIDER_ID.to_string(),
            })?;

        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", api_key));

        let url =
            reqwest::Url::parse_with_params(BASE_URL, &all_params).map_err(|e| {
                MarketError::Upstream {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to build URL: {}", e),
                }
            })?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(api_key, "***")
        );

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
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    /// Parses the body as `T` after surfacing any vendor notice.
    fn parse_checked<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, MarketError> {
        let notice: ApiNotice = serde_json::from_str(text).unwrap_or_default();
        check_api_error(&notice)?;

        serde_json::from_str(text).map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AlphaVantageAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full()
    }

    fn rate_limit(&self) -> RateLimit {
        // Free tier allows 5 calls/minute.
        RateLimit {
            requests_per_minute: 5,
            burst: 2,
        }
    }

    fn is_available(&self) -> bool {
        has_usable_key(self.api_key.as_deref())
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        debug!("Fetching latest quote for {} from Alpha Vantage", symbol);

        let text = self
            .fetch(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        let response: GlobalQuoteResponse = Self::parse_checked(&text)?;

        quote_from_response(symbol, response)
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleSeries, MarketError> {
        debug!(
            "Fetching {} candles for {} from Alpha Vantage ({} to {})",
            timeframe, symbol, start, end
        );

        let params: Vec<(&str, &str)> = if timeframe == Timeframe::D1 {
            vec![
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                // TIME_SERIES_DAILY: 'full' is premium-only
                ("outputsize", "compact"),
            ]
        } else {
            vec![
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval(timeframe)),
                ("outputsize", "compact"),
            ]
        };

        let text = self.fetch(&params).await?;
        let candles: Vec<Candle> = series_from_text(symbol, &text)?
            .into_iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .collect();

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
        debug!("Searching Alpha Vantage for '{}'", query);

        let text = self
            .fetch(&[("function", "SYMBOL_SEARCH"), ("keywords", query)])
            .await?;
        let response: SearchResponse = Self::parse_checked(&text)?;

        Ok(response
            .best_matches
            .iter()
            .take(SEARCH_LIMIT)
            .map(|item| SymbolMatch::new(&item.symbol, &item.name, &item.region))
            .collect())
    }
}

// ============================================================================
// Response Mapping
// ============================================================================

/// Alpha Vantage interval codes for intraday timeframes.
fn interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1min",
        Timeframe::M5 => "5min",
        Timeframe::M15 => "15min",
        Timeframe::M30 => "30min",
        Timeframe::D1 => "daily",
    }
}

fn check_api_error(notice: &ApiNotice) -> Result<(), MarketError> {
    if let Some(ref msg) = notice.error_message {
        // Invalid API call usually means the symbol does not exist.
        if msg.contains("Invalid API call") || msg.contains("not found") {
            return Err(MarketError::SymbolNotFound(msg.clone()));
        }
        return Err(MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: msg.clone(),
        });
    }

    // "Note" and "Information" usually mean the free-tier quota is spent.
    for msg in [&notice.note, &notice.information].into_iter().flatten() {
        if msg.contains("API call frequency")
            || msg.contains("rate limit")
            || msg.contains("per day")
            || msg.contains("premium")
        {
            return Err(MarketError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        warn!("Alpha Vantage notice: {}", msg);
    }

    Ok(())
}

fn quote_from_response(
    symbol: &str,
    response: GlobalQuoteResponse,
) -> Result<Quote, MarketError> {
    // Unknown symbols produce an empty "Global Quote" object.
    let inner = response.global_quote.unwrap_or_default();
    let price = inner
        .price
        .as_deref()
        .and_then(parse_decimal)
        .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))?;

    let timestamp = inner
        .latest_trading_day
        .as_deref()
        .and_then(|s| parse_timestamp(s))
        .unwrap_or_else(Utc::now);

    let mut quote = Quote::new(symbol, price, timestamp, DataSource::provider(PROVIDER_ID));

    if let Some(volume) = inner.volume.as_deref().and_then(|s| s.parse::<u64>().ok()) {
        quote = quote.with_volume(volume);
    }

    let change = inner.change.as_deref().and_then(parse_decimal);
    let change_percent = inner
        .change_percent
        .as_deref()
        .map(|s| s.trim_end_matches('%'))
        .and_then(parse_decimal);
    if let (Some(change), Some(change_percent)) = (change, change_percent) {
        quote = quote.with_change(change, change_percent);
    }

    Ok(quote)
}

/// Pulls the bar map out of a TIME_SERIES_* body. The map key varies with
/// the interval ("Time Series (Daily)", "Time Series (5min)", ...), so the
/// body is scanned instead of deserialized against a fixed field name.
fn series_from_text(symbol: &str, text: &str) -> Result<Vec<Candle>, MarketError> {
    let notice: ApiNotice = serde_json::from_str(text).unwrap_or_default();
    check_api_error(&notice)?;

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

    let series = value
        .as_object()
        .and_then(|obj| {
            obj.iter()
                .find(|(key, _)| key.starts_with("Time Series"))
                .map(|(_, v)| v.clone())
        })
        .ok_or_else(|| MarketError::SymbolNotFound(symbol.to_string()))?;

    let bars: HashMap<String, SeriesBar> =
        serde_json::from_value(series).map_err(|e| MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse time series: {}", e),
        })?;

    let mut candles: Vec<Candle> = bars
        .into_iter()
        .filter_map(|(date_str, bar)| {
            let timestamp = parse_timestamp(&date_str)?;
            Some(Candle {
                symbol: symbol.to_string(),
                timestamp,
                open: parse_decimal(&bar.open)?,
                high: parse_decimal(&bar.high)?,
                low: parse_decimal(&bar.low)?,
                close: parse_decimal(&bar.close)?,
                volume: bar.volume.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0),
            })
        })
        .collect();

    candles.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    debug!(
        "Alpha Vantage: parsed {} bars for {}",
        candles.len(),
        symbol
    );
    Ok(candles)
}

/// Accepts both the daily ("2024-01-03") and intraday
/// ("2024-01-03 19:55:00") timestamp forms.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_local_datetime(&dt).single();
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}
