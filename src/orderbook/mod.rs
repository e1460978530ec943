//! Order book module.
//!
//! ## Architecture
//!
//! The order book is a single-instrument limit order book with:
//!
//! - **Slab-based storage**: O(1) order insertion, removal, and lookup
//! - **Price levels**: Orders grouped by price using BTreeMap
//! - **Price-time priority**: FIFO ordering at each price level
//!
//! ## Components
//!
//! - [`OrderNode`]: Wrapper around `Order` with queue links and a level key
//! - [`PriceLevel`]: FIFO queue of orders at a single price point
//! - [`OrderBook`]: Bid/ask sides, id index, matching and cancellation
//! - [`BookSnapshot`]: Owned copy of the book for external consumers
//!
//! ## Performance
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | Place limit | O(log n) |
//! | Cancel by ID | O(log n) |
//! | Best bid/ask | O(log n) |
//! | Side volume | O(1) |
//! | Market order | O(k log n) |

pub mod node;
pub mod level;
pub mod book;
pub mod snapshot;

pub use node::{LevelKey, OrderNode};
pub use level::{LevelFill, PriceLevel};
pub use book::OrderBook;
pub use snapshot::{BookSnapshot, LevelSnapshot, OrderSnapshot};
