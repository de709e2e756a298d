use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Candle resolution for historical series.
///
/// The intraday set matches what the covered vendors serve natively. `D1` is
/// also the degradation target: a daily-only provider answers an intraday
/// request with daily bars and the returned series says so.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One minute bars.
    #[serde(rename = "1m")]
    M1,
    /// Five minute bars, the charting default.
    #[default]
    #[serde(rename = "5m")]
    M5,
    /// Fifteen minute bars.
    #[serde(rename = "15m")]
    M15,
    /// Thirty minute bars.
    #[serde(rename = "30m")]
    M30,
    /// Daily bars.
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Wire form, shared with the Yahoo interval vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::D1 => "1d",
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Timeframe::D1)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1d" | "d" | "daily" => Ok(Timeframe::D1),
            other => Err(format!("Unknown timeframe: {}", other)),
        }
    }
}
