//! Search result model for symbol lookup.

use serde::{Deserialize, Serialize};

/// One hit from a symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// Symbol/ticker (e.g. "AAPL", "SHOP.TO").
    pub symbol: String,

    /// Display name (e.g. "Apple Inc").
    #[serde(rename = "displayName")]
    pub name: String,

    /// Exchange name or hint (e.g. "NASDAQ"); vendors vary in what they give.
    pub exchange: String,
}

impl SymbolMatch {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            exchange: exchange.into(),
        }
    }
}
