//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `types` - ViewerId alias and symbol normalization
//! - `timeframe` - Candle resolutions (Timeframe)
//! - `quote` - Point-in-time prices and push payloads (Quote, PriceUpdate, DataSource)
//! - `candle` - OHLCV bars and series (Candle, CandleSeries)
//! - `search` - Search result data (SymbolMatch)

mod candle;
mod quote;
mod search;
mod timeframe;
mod types;

pub use candle::{Candle, CandleSeries};
pub use quote::{DataSource, PriceUpdate, Quote};
pub use search::SymbolMatch;
pub use timeframe::Timeframe;
pub use types::{normalize_symbol, ViewerId};
