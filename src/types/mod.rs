//! Core data types for the exchange matching core
//!
//! All numeric values use fixed-point representation (scaled by 10^8).
//!
//! ## Types
//!
//! - [`Order`]: A limit or market order and its fill state
//! - [`Side`]: Buy or Sell
//! - [`OrderType`]: Limit or Market
//! - [`MatchEvent`]: A fill between a resting order and an aggressor
//! - [`Market`]: Instrument name
//! - [`IdGenerator`]: Lock-free order id assignment

mod order;
mod match_event;
mod market;
pub mod ids;
pub mod price;

pub use order::{Order, OrderId, OrderType, Side, UserId};
pub use match_event::MatchEvent;
pub use market::Market;
pub use ids::IdGenerator;
