//! Instrument naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a tradable instrument, e.g. `ETH-USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market(String);

impl Market {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Market {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl From<String> for Market {
    fn from(symbol: String) -> Self {
        Self(symbol)
    }
}
