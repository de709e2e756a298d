//! Error types and fallback classification for market data operations.
//!
//! This module provides:
//! - [`MarketError`]: the error enum for everything that can go wrong while
//!   fetching market data
//! - [`FallbackAction`]: how the aggregator's provider chain reacts to each
//!   error kind

mod fallback;

pub use fallback::FallbackAction;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Adapter errors never escape the aggregator: each variant classifies into
/// a [`FallbackAction`] via [`fallback_action`](Self::fallback_action), which
/// tells the chain whether to skip, continue, record, or stop.
///
/// # Example
///
/// ```
/// use papertrade_market_data::errors::{FallbackAction, MarketError};
///
/// let error = MarketError::RateLimited {
///     provider: "FINNHUB".to_string(),
/// };
/// assert_eq!(error.fallback_action(), FallbackAction::Continue);
/// ```
#[derive(Error, Debug)]
pub enum MarketError {
    /// The provider has no usable credential and was never called.
    #[error("Provider not configured: {provider}")]
    Unavailable {
        /// Provider id (e.g. "FINNHUB").
        provider: String,
    },

    /// The provider rejected the request for quota reasons, either an HTTP
    /// 429 or a vendor throttle notice in the body.
    #[error("Rate limited by provider: {provider}")]
    RateLimited {
        /// Provider id (e.g. "ALPHA_VANTAGE").
        provider: String,
    },

    /// The provider answered but does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The call did not complete within the configured per-provider deadline.
    #[error("Request to {provider} timed out")]
    Timeout {
        /// Provider id.
        provider: String,
    },

    /// The provider answered with a transport, protocol or parse failure.
    #[error("Upstream error from {provider}: {message}")]
    Upstream {
        /// Provider id.
        provider: String,
        /// Human-readable detail, safe to log.
        message: String,
    },

    /// The provider answered successfully but with zero rows for the
    /// requested range.
    #[error("No data for the requested range")]
    EmptyRange,

    /// Every provider in the chain was tried without producing a usable
    /// result. Produced by the aggregator itself, never by an adapter.
    #[error("All providers exhausted for symbol: {symbol}")]
    AllProvidersExhausted {
        /// Normalized symbol that was being fetched.
        symbol: String,
    },

    /// A network error occurred before any provider-specific handling could
    /// classify it.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketError {
    /// How the fallback chain should react to this error.
    pub fn fallback_action(&self) -> FallbackAction {
        match self {
            // Never attempted, does not count against the chain
            MarketError::Unavailable { .. } => FallbackAction::Skip,

            // Soft failures, log and move to the next provider
            MarketError::RateLimited { .. }
            | MarketError::Timeout { .. }
            | MarketError::Upstream { .. }
            | MarketError::EmptyRange
            | MarketError::Network(_) => FallbackAction::Continue,

            // Remembered so the aggregator can tell "nobody knows this
            // symbol" apart from "everything is down"
            MarketError::SymbolNotFound(_) => FallbackAction::RecordAndContinue,

            // Terminal, nothing left to try
            MarketError::AllProvidersExhausted { .. } => FallbackAction::Halt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(provider: &str) -> MarketError {
        MarketError::Upstream {
            provider: provider.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_unavailable_skips() {
        let error = MarketError::Unavailable {
            provider: "FINNHUB".to_string(),
        };
        assert_eq!(error.fallback_action(), FallbackAction::Skip);
    }

    #[test]
    fn test_soft_failures_continue() {
        let rate_limited = MarketError::RateLimited {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        let timeout = MarketError::Timeout {
            provider: "YAHOO".to_string(),
        };

        assert_eq!(rate_limited.fallback_action(), FallbackAction::Continue);
        assert_eq!(timeout.fallback_action(), FallbackAction::Continue);
        assert_eq!(upstream("STOOQ").fallback_action(), FallbackAction::Continue);
        assert_eq!(MarketError::EmptyRange.fallback_action(), FallbackAction::Continue);
    }

    #[test]
    fn test_not_found_is_recorded() {
        let error = MarketError::SymbolNotFound("ZZZZ".to_string());
        assert_eq!(error.fallback_action(), FallbackAction::RecordAndContinue);
    }

    #[test]
    fn test_exhausted_halts() {
        let error = MarketError::AllProvidersExhausted {
            symbol: "AAPL".to_string(),
        };
        assert_eq!(error.fallback_action(), FallbackAction::Halt);
    }

    #[test]
    fn test_display_messages() {
        let error = MarketError::SymbolNotFound("ZZZZ".to_string());
        assert_eq!(error.to_string(), "Symbol not found: ZZZZ");

        let error = upstream("FINNHUB");
        assert_eq!(error.to_string(), "Upstream error from FINNHUB: boom");

        let error = MarketError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.to_string(), "Request to YAHOO timed out");
    }
}
