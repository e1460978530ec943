//! Error types.
//!
//! Every operation-level failure is recoverable by the caller and leaves the
//! book exactly as it was. [`BookError::InvalidFill`] is the exception: it
//! signals a broken matching invariant and should never be observed.

use thiserror::Error;

use crate::types::{Market, OrderId, Side};

/// Failures of a single order book operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Cancel target is not resting in the book
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Opposing side cannot fully satisfy a market order; nothing was filled
    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },

    /// An order was asked to fill more than it has left
    #[error("invalid fill on order {order_id}: requested {requested}, remaining {remaining}")]
    InvalidFill {
        order_id: OrderId,
        requested: u64,
        remaining: u64,
    },

    #[error("order size must be positive")]
    ZeroSize,

    #[error("limit price must be positive")]
    ZeroPrice,

    #[error("limit order requires a price")]
    MissingPrice,

    #[error("order {0} already in the book")]
    DuplicateOrder(OrderId),

    /// Resting size on one side would exceed `u64::MAX`
    #[error("{side:?} volume overflow: resting {resting}, adding {size}")]
    VolumeOverflow { side: Side, resting: u64, size: u64 },
}

/// Failures of the multi-market service layer.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("market not found: {0}")]
    MarketNotFound(Market),

    #[error("market already registered: {0}")]
    DuplicateMarket(Market),

    #[error(transparent)]
    Book(#[from] BookError),
}

/// Failure reported by the settlement collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("failed to encode match event: {0}")]
    Encoding(String),

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
