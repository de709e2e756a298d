use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a payload came from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// A real upstream vendor, by provider id ("YAHOO", "FINNHUB", ...).
    Provider(String),
    /// The random-walk generator. Plausible numbers, fabricated data.
    Synthetic,
}

impl DataSource {
    pub fn provider(id: impl Into<String>) -> Self {
        DataSource::Provider(id.into())
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataSource::Provider(id) => id,
            DataSource::Synthetic => "SYNTHETIC",
        }
    }
}

/// A point-in-time price for one symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Normalized symbol the quote answers for.
    pub symbol: String,

    /// Last traded or generated price.
    pub price: Decimal,

    /// When the price was observed upstream (or generated).
    pub timestamp: DateTime<Utc>,

    /// Absolute change versus the previous close, when the source provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change versus the previous close, when the source provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Session volume, when the source provides it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,

    /// Which provider (or the generator) produced this quote.
    pub source: DataSource,
}

impl Quote {
    /// Minimal quote; change and volume start unset.
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        timestamp: DateTime<Utc>,
        source: DataSource,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            change: None,
            change_percent: None,
            volume: None,
            source,
        }
    }

    pub fn with_change(mut self, change: Decimal, change_percent: Decimal) -> Self {
        self.change = Some(change);
        self.change_percent = Some(change_percent);
        self
    }

    pub fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Outbound push message delivered to subscribed viewers on every tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl From<&Quote> for PriceUpdate {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            price: quote.price,
            timestamp: quote.timestamp,
        }
    }
}
