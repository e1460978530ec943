//! Exchange configuration.
//!
//! ```toml
//! notify_capacity = 1024
//!
//! [[markets]]
//! symbol = "ETH-USD"
//! order_capacity = 100000
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::Market;

const DEFAULT_ORDER_CAPACITY: usize = 10_000;
const DEFAULT_NOTIFY_CAPACITY: usize = 1_024;

fn default_order_capacity() -> usize {
    DEFAULT_ORDER_CAPACITY
}

fn default_notify_capacity() -> usize {
    DEFAULT_NOTIFY_CAPACITY
}

/// Top-level exchange configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Instruments to open a book for
    pub markets: Vec<MarketConfig>,

    /// Buffered book change signals before new ones are dropped
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

/// Per-instrument configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub symbol: Market,

    /// Resting orders to pre-allocate slots for
    #[serde(default = "default_order_capacity")]
    pub order_capacity: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            markets: vec![MarketConfig {
                symbol: Market::new("ETH-USD"),
                order_capacity: DEFAULT_ORDER_CAPACITY,
            }],
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

impl ExchangeConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markets.is_empty() {
            return Err(ConfigError::Invalid("at least one market is required".into()));
        }
        if self.notify_capacity == 0 {
            return Err(ConfigError::Invalid("notify_capacity must be positive".into()));
        }

        let mut seen = HashSet::new();
        for market in &self.markets {
            if market.symbol.as_str().is_empty() {
                return Err(ConfigError::Invalid("market symbol must not be empty".into()));
            }
            if !seen.insert(&market.symbol) {
                return Err(ConfigError::Invalid(format!("duplicate market {}", market.symbol)));
            }
        }
        Ok(())
    }
}
