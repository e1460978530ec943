//! Lock-guarded single-instrument matching engine.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BookError;
use crate::orderbook::{BookSnapshot, OrderBook};
use crate::types::{IdGenerator, Market, MatchEvent, Order, OrderId, Side, UserId};

/// Result of an executed market order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketFill {
    /// Id assigned to the market order
    pub order_id: OrderId,

    /// Fills in execution order
    pub events: Vec<MatchEvent>,
}

impl MarketFill {
    /// Total size executed
    pub fn filled_size(&self) -> u64 {
        self.events.iter().map(|event| event.filled_size).sum()
    }
}

/// One instrument's book behind a single-writer/multiple-reader lock.
///
/// All methods take `&self`; share the engine across threads with an `Arc`.
#[derive(Debug)]
pub struct MatchingEngine {
    market: Market,
    book: RwLock<OrderBook>,
    ids: Arc<IdGenerator>,
}

impl MatchingEngine {
    /// Create an engine with its own id generator
    pub fn new(market: impl Into<Market>) -> Self {
        Self::with_capacity(market, 0, Arc::new(IdGenerator::new()))
    }

    /// Create an engine with a pre-sized book and a shared id generator
    pub fn with_capacity(market: impl Into<Market>, order_capacity: usize, ids: Arc<IdGenerator>) -> Self {
        Self {
            market: market.into(),
            book: RwLock::new(OrderBook::with_capacity(order_capacity)),
            ids,
        }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Rest a limit order and return its id.
    pub fn place_limit(&self, side: Side, price: u64, size: u64, user: UserId) -> Result<OrderId, BookError> {
        if size == 0 {
            return Err(BookError::ZeroSize);
        }
        if price == 0 {
            return Err(BookError::ZeroPrice);
        }
        let order = Order::limit(self.ids.next_id(), user, side, price, size);
        self.book.write().place_limit(order)
    }

    /// Execute a market order, all-or-nothing.
    pub fn place_market(&self, side: Side, size: u64, user: UserId) -> Result<MarketFill, BookError> {
        if size == 0 {
            return Err(BookError::ZeroSize);
        }
        let order = Order::market(self.ids.next_id(), user, side, size);
        let order_id = order.id;
        let events = self.book.write().place_market(order)?;
        Ok(MarketFill { order_id, events })
    }

    /// Cancel a resting order, returning what was left of it.
    pub fn cancel(&self, order_id: OrderId) -> Result<Order, BookError> {
        self.book.write().cancel(order_id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn snapshot(&self) -> BookSnapshot {
        self.book.read().snapshot()
    }

    pub fn best_bid(&self) -> Option<u64> {
        self.book.read().best_bid()
    }

    pub fn best_ask(&self) -> Option<u64> {
        self.book.read().best_ask()
    }

    pub fn bid_volume(&self) -> u64 {
        self.book.read().bid_volume()
    }

    pub fn ask_volume(&self) -> u64 {
        self.book.read().ask_volume()
    }

    pub fn order_count(&self) -> usize {
        self.book.read().order_count()
    }

    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.book.read().contains_order(order_id)
    }

    /// Run `f` against the book under the read lock
    pub fn with_book<R>(&self, f: impl FnOnce(&OrderBook) -> R) -> R {
        f(&self.book.read())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_ids_come_from_shared_generator() {
        let ids = Arc::new(IdGenerator::starting_at(100));
        let a = MatchingEngine::with_capacity("A-USD", 16, Arc::clone(&ids));
        let b = MatchingEngine::with_capacity("B-USD", 16, Arc::clone(&ids));

        assert_eq!(a.place_limit(Side::Buy, 10, 1, 1).unwrap(), 100);
        assert_eq!(b.place_limit(Side::Buy, 10, 1, 1).unwrap(), 101);
        assert_eq!(a.place_market(Side::Sell, 1, 2).unwrap().order_id, 102);
        assert_eq!(ids.peek(), 103);
    }

    #[test]
    fn test_validation_happens_before_lock() {
        let engine = MatchingEngine::new("ETH-USD");

        assert_eq!(engine.place_limit(Side::Buy, 10, 0, 1), Err(BookError::ZeroSize));
        assert_eq!(engine.place_limit(Side::Buy, 0, 1, 1), Err(BookError::ZeroPrice));
        assert_eq!(engine.place_market(Side::Buy, 0, 1), Err(BookError::ZeroSize));
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_volume_overflow_keeps_book_usable() {
        let engine = MatchingEngine::new("ETH-USD");
        engine.place_limit(Side::Buy, 100, u64::MAX, 1).unwrap();

        assert!(matches!(
            engine.place_limit(Side::Buy, 101, 1, 2),
            Err(BookError::VolumeOverflow { .. })
        ));
        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.best_bid(), Some(100));
        engine.with_book(|book| book.check_invariants()).unwrap();

        // Liquidity check still sees the true total
        let fill = engine.place_market(Side::Sell, u64::MAX, 3).unwrap();
        assert_eq!(fill.filled_size(), u64::MAX);
        assert_eq!(engine.bid_volume(), 0);
    }

    #[test]
    fn test_market_fill_totals() {
        let engine = MatchingEngine::new("ETH-USD");
        engine.place_limit(Side::Sell, 100, 3, 1).unwrap();
        engine.place_limit(Side::Sell, 101, 3, 1).unwrap();

        let fill = engine.place_market(Side::Buy, 5, 2).unwrap();
        assert_eq!(fill.filled_size(), 5);
        assert_eq!(fill.events.len(), 2);
        assert_eq!(engine.best_ask(), Some(101));
        assert_eq!(engine.ask_volume(), 1);
    }

    #[test]
    fn test_concurrent_placements_keep_invariants() {
        let engine = Arc::new(MatchingEngine::new("ETH-USD"));

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..250u64 {
                        let side = if (t + i) % 2 == 0 { Side::Buy } else { Side::Sell };
                        let price = if side == Side::Buy { 90 + i % 5 } else { 110 + i % 5 };
                        engine.place_limit(side, price, 1 + i % 3, t).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.order_count(), 1_000);
        engine.with_book(|book| book.check_invariants()).unwrap();
    }
}
