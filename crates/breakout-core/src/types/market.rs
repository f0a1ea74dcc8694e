//! Exchange venue definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange venue a price record was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    /// Taiwan Stock Exchange (listed securities)
    #[serde(rename = "TWSE")]
    Primary,
    /// Taipei Exchange (over-the-counter securities)
    #[serde(rename = "TPEx")]
    Secondary,
}

impl Market {
    /// Short exchange code used in exports and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Market::Primary => "TWSE",
            Market::Secondary => "TPEx",
        }
    }

    /// Get all markets in fetch order.
    pub fn all() -> &'static [Market] {
        &[Market::Primary, Market::Secondary]
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twse" | "primary" | "listed" => Ok(Market::Primary),
            "tpex" | "secondary" | "otc" => Ok(Market::Secondary),
            _ => Err(format!("Invalid market: {}", s)),
        }
    }
}
