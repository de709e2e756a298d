//! Last-resort data generation.
//!
//! When every real provider fails, the aggregator answers from a seeded
//! random walk instead of returning nothing. The walk is keyed by symbol:
//! the same symbol always produces the same history, different symbols
//! diverge, and no state is kept between calls. Generated data is plausible
//! for charting a simulator, nothing more.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use log::debug;
use num_traits::FromPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal};
use rust_decimal::Decimal;

use crate::models::{Candle, CandleSeries, DataSource, Quote, Timeframe};

/// Daily log-return volatility of the walk.
const DEFAULT_VOLATILITY: f64 = 0.02;

/// Slight upward drift so long synthetic histories trend like equities.
const DEFAULT_DRIFT: f64 = 0.0005;

/// Largest tick-to-tick jitter applied by [`SyntheticGenerator::quote`].
const QUOTE_JITTER: f64 = 0.003;

/// Prices never drop below one cent.
fn price_floor() -> Decimal {
    Decimal::new(1, 2)
}

/// Seeded random-walk generator for symbols no provider can serve.
#[derive(Clone, Debug)]
pub struct SyntheticGenerator {
    volatility: f64,
    drift: f64,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self {
            volatility: DEFAULT_VOLATILITY,
            drift: DEFAULT_DRIFT,
        }
    }
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator with a custom daily volatility. Returns `None` unless
    /// `volatility` lies in `(0, 1]`.
    pub fn with_volatility(volatility: f64) -> Option<Self> {
        if !volatility.is_finite() || volatility <= 0.0 || volatility > 1.0 {
            return None;
        }
        Some(Self {
            volatility,
            ..Self::default()
        })
    }

    /// Business-day OHLCV series ending on the most recent business day,
    /// `days` rows, oldest first. Deterministic per (symbol, days).
    pub fn daily_series(&self, symbol: &str, days: u32) -> CandleSeries {
        let days = days.max(1) as usize;
        let mut rng = StdRng::seed_from_u64(seed_for(symbol));
        // Sigma is validated at construction; a failed build degrades to a
        // flat walk rather than panicking.
        let step = LogNormal::new(self.drift, self.volatility).ok();

        debug!("Generating {} synthetic daily bars for {}", days, symbol);

        let base = rng.gen_range(20.0..500.0_f64);
        let intrabar = self.volatility / 2.0;
        let mut prev_close = base;
        let mut candles = Vec::with_capacity(days);

        for day in business_days_back(Utc::now().date_naive(), days) {
            let multiplier = step.as_ref().map(|d| d.sample(&mut rng)).unwrap_or(1.0);
            let open = prev_close;
            let close = (open * multiplier).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..intrabar));
            let low = (open.min(close) * (1.0 - rng.gen_range(0.0..intrabar))).max(0.01);
            let volume = rng.gen_range(100_000..5_000_000_u64);

            candles.push(Candle {
                symbol: symbol.to_string(),
                timestamp: midnight_utc(day),
                open: to_price(open),
                high: to_price(high),
                low: to_price(low),
                close: to_price(close),
                volume,
            });
            prev_close = close;
        }

        CandleSeries::new(symbol, Timeframe::D1, DataSource::Synthetic, candles)
    }

    /// Live quote derived from the walk's latest close.
    ///
    /// A small jitter is reseeded from (symbol, current minute), so repeated
    /// ticks within a minute agree with each other and the price still moves
    /// over time without the generator holding any state.
    pub fn quote(&self, symbol: &str) -> Quote {
        self.quote_at(symbol, Utc::now().timestamp() / 60)
    }

    fn quote_at(&self, symbol: &str, minute: i64) -> Quote {
        let series = self.daily_series(symbol, 2);
        let last_close = series
            .candles
            .last()
            .map(|c| c.close)
            .unwrap_or_else(price_floor);
        let prev_close = series
            .candles
            .first()
            .map(|c| c.close)
            .unwrap_or(last_close);

        let mut rng = StdRng::seed_from_u64(seed_for(symbol) ^ (minute as u64));
        let jitter = Decimal::from_f64(1.0 + rng.gen_range(-QUOTE_JITTER..QUOTE_JITTER))
            .unwrap_or(Decimal::ONE);
        let price = (last_close * jitter).round_dp(2).max(price_floor());

        let change = price - prev_close;
        let change_percent = if prev_close > Decimal::ZERO {
            (change / prev_close * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Quote::new(symbol, price, Utc::now(), DataSource::Synthetic)
            .with_change(change.round_dp(2), change_percent)
            .with_volume(rng.gen_range(100_000..5_000_000))
    }
}

/// Stable per-symbol seed. `DefaultHasher::new` uses fixed keys, so the same
/// symbol seeds the same walk across processes.
fn seed_for(symbol: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    symbol.hash(&mut hasher);
    hasher.finish()
}

/// The `count` most recent business days up to and including `end` (when it
/// is one), oldest first. Weekends are skipped; holidays are not modeled.
fn business_days_back(end: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut day = end;
    while days.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    days.reverse();
    days
}

fn midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .unwrap_or_else(Utc::now)
}

fn to_price(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp(2)
        .max(price_floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_symbol_same_series() {
        let generator = SyntheticGenerator::new();
        let first = generator.daily_series("FAKE", 30);
        let second = generator.daily_series("FAKE", 30);

        assert_eq!(first.candles, second.candles);
        assert!(first.is_synthetic());
        assert_eq!(first.timeframe, Timeframe::D1);
    }

    #[test]
    fn test_different_symbols_diverge() {
        let generator = SyntheticGenerator::new();
        let a = generator.daily_series("FAKE", 30);
        let b = generator.daily_series("OTHER", 30);

        assert_ne!(a.candles, b.candles);
    }

    #[test]
    fn test_ohlc_invariants_hold() {
        let generator = SyntheticGenerator::new();
        let series = generator.daily_series("FAKE", 120);

        assert_eq!(series.len(), 120);
        for candle in &series.candles {
            assert!(candle.high >= candle.open.max(candle.close), "{:?}", candle);
            assert!(candle.low <= candle.open.min(candle.close), "{:?}", candle);
            assert!(candle.low >= price_floor());
            assert!(candle.volume >= 100_000);
        }
    }

    #[test]
    fn test_weekends_are_skipped() {
        let generator = SyntheticGenerator::new();
        let series = generator.daily_series("FAKE", 30);

        for candle in &series.candles {
            let weekday = candle.timestamp.date_naive().weekday();
            assert!(!matches!(weekday, Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn test_series_is_strictly_ascending() {
        let generator = SyntheticGenerator::new();
        let series = generator.daily_series("FAKE", 30);

        for pair in series.candles.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_business_days_back_helper() {
        // 2024-01-10 is a Wednesday.
        let end = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let days = business_days_back(end, 5);

        let expected: Vec<NaiveDate> = [4, 5, 8, 9, 10]
            .iter()
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, *d).unwrap())
            .collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn test_quote_is_stable_within_a_minute() {
        let generator = SyntheticGenerator::new();
        let first = generator.quote_at("FAKE", 28_000_000);
        let second = generator.quote_at("FAKE", 28_000_000);

        assert_eq!(first.price, second.price);
        assert!(first.source.is_synthetic());

        // Over a few minutes the jitter has to land on a new cent somewhere.
        let moved =
            (1..=5).any(|i| generator.quote_at("FAKE", 28_000_000 + i).price != first.price);
        assert!(moved);
    }

    #[test]
    fn test_quote_stays_near_last_close() {
        let generator = SyntheticGenerator::new();
        let series = generator.daily_series("FAKE", 2);
        let last_close = series.candles.last().unwrap().close;
        let quote = generator.quote_at("FAKE", 28_000_000);

        let band = last_close * Decimal::new(4, 3); // 0.4%
        assert!((quote.price - last_close).abs() <= band);
        assert!(quote.change.is_some());
        assert!(quote.volume.is_some());
    }

    #[test]
    fn test_volatility_validation() {
        assert!(SyntheticGenerator::with_volatility(0.5).is_some());
        assert!(SyntheticGenerator::with_volatility(0.0).is_none());
        assert!(SyntheticGenerator::with_volatility(-0.1).is_none());
        assert!(SyntheticGenerator::with_volatility(1.5).is_none());
        assert!(SyntheticGenerator::with_volatility(f64::NAN).is_none());
    }
}
