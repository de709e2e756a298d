use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::DataSource;
use super::timeframe::Timeframe;

/// One OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    /// Bar open time, UTC.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// An ordered candle series plus the resolution actually delivered.
///
/// `timeframe` records what the provider really returned, which may be
/// coarser than what was asked for: a daily-only vendor answering a `5m`
/// request hands back a `D1` series, and callers can see the degradation
/// instead of charting wrong-resolution bars.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub source: DataSource,
    /// Ascending by timestamp, one bar per timestamp.
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    /// Builds a series, sorting and deduplicating the bars.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        source: DataSource,
        candles: Vec<Candle>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            source,
            candles: normalize_bars(candles),
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

/// Sort ascending and collapse duplicate timestamps. Vendors resend
/// corrected rows; the row seen last wins.
fn normalize_bars(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match out.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => *last = candle,
            _ => out.push(candle),
        }
    }
    out
}
