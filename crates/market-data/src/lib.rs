//! Papertrade Market Data Crate
//!
//! This crate feeds a paper trading platform with real market data and keeps
//! feeding it something plausible when the real thing is unavailable.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple providers: Yahoo Finance, Finnhub, Alpha Vantage, Stooq
//! - Priority-ordered fallback with per-provider rate budgets and deadlines
//! - Short-TTL caching of quotes, candles and search results
//! - A deterministic synthetic generator as the terminal fallback
//! - Per-symbol broadcast loops streaming price updates to viewers
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +------------------+
//! |      Host        | ---> | MarketDataService|  (facade)
//! +------------------+      +------------------+
//!                              |            |
//!                 reads        |            |  streams
//!                              v            v
//!                    +------------+   +--------------------+
//!                    | Aggregator |<--| SubscriptionRegistry|
//!                    +------------+   +--------------------+
//!                      |   |   |        one broadcast loop
//!                      |   |   |        per watched symbol
//!            +---------+   |   +-----------+
//!            v             v               v
//!     +------------+  +----------+  +-----------+
//!     | QuoteCache |  | Provider |  | Synthetic |
//!     +------------+  | chain    |  | generator |
//!                     +----------+  +-----------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketDataService`] - the facade hosts talk to
//! - [`MarketDataConfig`] - credentials, priorities, intervals
//! - [`Quote`] / [`Candle`] / [`CandleSeries`] - market data payloads
//! - [`PriceUpdate`] - the streamed tick payload
//! - [`DataSource`] - whether a payload is real or synthesized
//! - [`MarketError`] - everything that can go wrong, with its fallback
//!   classification

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod provider;
pub mod stream;
pub mod synthetic;

mod service;

// Re-export the public surface
pub use config::{MarketDataConfig, ProviderSettings};
pub use errors::{FallbackAction, MarketError};
pub use models::{
    Candle, CandleSeries, DataSource, PriceUpdate, Quote, SymbolMatch, Timeframe, ViewerId,
};
pub use provider::{build_adapters, ProviderAdapter, ProviderCapabilities, RateLimit};
pub use service::MarketDataService;
pub use stream::SubscriptionRegistry;
