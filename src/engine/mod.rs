//! Matching engine module.
//!
//! ## Design Principles
//!
//! The engine is the concurrency guard around one [`OrderBook`](crate::orderbook::OrderBook):
//!
//! 1. **One operation per lock hold**: placements and cancels take the write
//!    lock for exactly one book operation
//! 2. **Readers share**: snapshots and best-price/volume queries take the read lock
//! 3. **No work under the lock** beyond the book itself: id assignment
//!    happens before, settlement and broadcast happen after
//! 4. **Synchronous Execution**: no async, no suspension points inside the lock
//!
//! ## Example
//!
//! ```
//! use exchange_core::engine::MatchingEngine;
//! use exchange_core::types::Side;
//!
//! let engine = MatchingEngine::new("ETH-USD");
//!
//! engine.place_limit(Side::Sell, 10_000, 20, 100).unwrap();
//! let fill = engine.place_market(Side::Buy, 10, 200).unwrap();
//!
//! assert_eq!(fill.events.len(), 1);
//! assert_eq!(engine.ask_volume(), 10);
//! ```

pub mod matcher;

pub use matcher::{MarketFill, MatchingEngine};
