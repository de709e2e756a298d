//! Finnhub market data adapter.
//!
//! This module provides market data from the Finnhub API:
//! - Latest quotes via /quote (includes change versus previous close)
//! - OHLCV history via /stock/candle at 1/5/15/30 minute and daily resolution
//! - Symbol search via /search
//!
//! Finnhub quirks handled here: unknown symbols come back as a zeroed quote
//! object rather than a 404, candle payloads are parallel arrays that must
//! agree in length, and plan limits surface as HTTP 403 as well as 429.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use num_traits::FromPrimitive;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::MarketError;
use crate::models::{Candle, CandleSeries, DataSource, Quote, SymbolMatch, Timeframe};
use crate::provider::{
    has_usable_key, ProviderAdapter, ProviderCapabilities, RateLimit, SEARCH_LIMIT,
};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price. Zero for unknown symbols.
    #[serde(default)]
    c: f64,
    /// Change versus previous close
    d: Option<f64>,
    /// Percent change versus previous close
    dp: Option<f64>,
    /// Timestamp (Unix). Zero for unknown symbols.
    #[serde(default)]
    t: i64,
}

/// Response from /stock/candle endpoint
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Timestamps (Unix)
    #[serde(default)]
    t: Vec<i64>,
    /// Open prices
    #[serde(default)]
    o: Vec<f64>,
    /// High prices
    #[serde(default)]
    h: Vec<f64>,
    /// Low prices
    #[serde(default)]
    l: Vec<f64>,
    /// Close prices
    #[serde(default)]
    c: Vec<f64>,
    /// Volumes
    #[serde(default)]
    v: Vec<f64>,
}

/// Response from /search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    /// Company or instrument description
    description: String,
    /// Symbol as displayed, often with exchange context
    display_symbol: String,
    /// Symbol to use for subsequent quote calls
    symbol: String,
}

/// Error payload Finnhub attaches to non-2xx answers
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Finnhub Adapter
// ============================================================================

/// Finnhub, the default second provider.
pub struct FinnhubAdapter {
    client: Client,
    api_key: Option<String>,
}

impl FinnhubAdapter {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Issues a GET against `path`, mapping Finnhub's status conventions
    /// onto [`MarketError`] before deserializing.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketError::Unavailable {
                provider: PROVIDER_ID.to_string(),
            })?;

        let url = format!("{}{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .header("X-Finnhub-Token", api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketError::Network(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(MarketError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorResponse>(&body).ok())
                .map(|e| e.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MarketError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })
    }
}

#[async_trait]
impl ProviderAdapter for FinnhubAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::full()
    }

    fn rate_limit(&self) -> RateLimit {
        // Free tier allows 60 calls/minute with short bursts tolerated.
        RateLimit {
            requests_per_minute: 60,
            burst: 10,
        }
    }

    fn is_available(&self) -> bool {
        has_usable_key(self.api_key.as_deref())
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        debug!("Fetching latest quote for {} from Finnhub", symbol);

        let response: QuoteResponse = self.fetch("/quote", &[("symbol", symbol)]).await?;
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
            "Fetching {} candles for {} from Finnhub ({} to {})",
            timeframe, symbol, start, end
        );

        let from = start.timestamp().to_string();
        let to = end.timestamp().to_string();
        let response: CandleResponse = self
            .fetch(
                "/stock/candle",
                &[
                    ("symbol", symbol),
                    ("resolution", resolution(timeframe)),
                    ("from", &from),
                    ("to", &to),
                ],
            )
            .await?;

        let candles = candles_from_response(symbol, response)?;
        Ok(CandleSeries::new(
            symbol,
            timeframe,
            DataSource::provider(PROVIDER_ID),
            candles,
        ))
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketError> {
        debug!("Searching Finnhub for '{}'", query);

        let response: SearchResponse = self.fetch("/search", &[("q", query)]).await?;

        Ok(response
            .result
            .iter()
            .take(SEARCH_LIMIT)
            .map(|item| {
                // No exchange field; the display symbol is the closest hint.
                SymbolMatch::new(&item.symbol, &item.description, &item.display_symbol)
            })
            .collect())
    }
}

// ============================================================================
// Response Mapping
// ============================================================================

/// Finnhub resolution code for each timeframe.
fn resolution(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M1 => "1",
        Timeframe::M5 => "5",
        Timeframe::M15 => "15",
        Timeframe::M30 => "30",
        Timeframe::D1 => "D",
    }
}

fn quote_from_response(symbol: &str, response: QuoteResponse) -> Result<Quote, MarketError> {
    // Unknown symbols come back as a zeroed object, not an error status.
    if response.c <= 0.0 {
        return Err(MarketError::SymbolNotFound(symbol.to_string()));
    }

    let price = Decimal::from_f64(response.c).ok_or_else(|| MarketError::Upstream {
        provider: PROVIDER_ID.to_string(),
        message: format!("Invalid price for {}: {}", symbol, response.c),
    })?;

    let timestamp = if response.t > 0 {
        Utc.timestamp_opt(response.t, 0)
            .single()
            .unwrap_or_else(Utc::now)
    } else {
        Utc::now()
    };

    let mut quote = Quote::new(symbol, price, timestamp, DataSource::provider(PROVIDER_ID));
    if let (Some(d), Some(dp)) = (response.d, response.dp) {
        if let (Some(change), Some(change_percent)) = (Decimal::from_f64(d), Decimal::from_f64(dp))
        {
            quote = quote.with_change(change, change_percent);
        }
    }
    Ok(quote)
}

fn candles_from_response(
    symbol: &str,
    response: CandleResponse,
) -> Result<Vec<Candle>, MarketError> {
    if response.s == "no_data" {
        return Err(MarketError::EmptyRange);
    }
    if response.s != "ok" {
        return Err(MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Candle status: {}", response.s),
        });
    }

    let n = response.t.len();
    let lengths = [
        response.o.len(),
        response.h.len(),
        response.l.len(),
        response.c.len(),
        response.v.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(MarketError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: "Mismatched candle array lengths".to_string(),
        });
    }

    let mut candles = Vec::with_capacity(n);
    for i in 0..n {
        let row = (
            Utc.timestamp_opt(response.t[i], 0).single(),
            Decimal::from_f64(response.o[i]),
            Decimal::from_f64(response.h[i]),
            Decimal::from_f64(response.l[i]),
            Decimal::from_f64(response.c[i]),
        );
        match row {
            (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => {
                candles.push(Candle {
                    symbol: symbol.to_string(),
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume: response.v[i].max(0.0) as u64,
                });
            }
            _ => warn!(
                "Skipping malformed Finnhub bar for {} at index {}",
                symbol, i
            ),
        }
    }

    if candles.is_empty() {
        return Err(MarketError::EmptyRange);
    }
    Ok(candles)
}
