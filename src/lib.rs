//! # Exchange Core
//!
//! In-memory limit order book and matching core for a single-venue exchange.
//!
//! ## Architecture
//!
//! - **Types**: Core data structures (Order, MatchEvent, Market)
//! - **OrderBook**: Price-time priority book with slab-based storage
//! - **Engine**: Lock-guarded book for one instrument
//! - **Exchange**: Per-market routing, settlement hand-off and change signals
//!
//! ## Design Principles
//!
//! 1. **Determinism**: Identical operation sequences produce identical books
//! 2. **No Floating Point**: All math uses fixed-point arithmetic (10^8 scaling)
//! 3. **Pre-allocated Memory**: Slab allocation for O(1) order operations
//! 4. **Synchronous Execution**: No async anywhere on the matching path
//! 5. **All-or-nothing market orders**: Liquidity is checked before any fill

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Order, MatchEvent, Market, ids and fixed-point helpers
pub mod types;

/// Error types for every layer
pub mod error;

/// TOML configuration
pub mod config;

/// Order book: price levels, FIFO queues, matching and snapshots
pub mod orderbook;

/// Matching engine: one book behind a read/write lock
pub mod engine;

/// Exchange: market routing, settlement and notifications
pub mod exchange;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use types::{Market, MatchEvent, Order, OrderId, OrderType, Side, UserId};
pub use error::{BookError, ConfigError, ExchangeError, SettlementError};
pub use config::{ExchangeConfig, MarketConfig};
pub use orderbook::{BookSnapshot, OrderBook, PriceLevel};
pub use engine::{MarketFill, MatchingEngine};
pub use exchange::{Exchange, PlaceOrderRequest, PlaceOrderResponse};
