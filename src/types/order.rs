//! Order types for the exchange matching core.
//!
//! Prices and sizes are raw fixed-point integers (see [`crate::types::price`]).
//!
//! An order is created on placement, shrinks on every fill and leaves the book
//! when its remaining size reaches zero or it is cancelled. It is never resurrected.

use serde::Serialize;

use crate::error::BookError;
use crate::types::ids::next_sequence;

/// Process-unique order identifier.
pub type OrderId = u64;

/// Owning user/account identifier.
pub type UserId = u64;

/// Which book side an order belongs to.
///
/// Encoded as a single byte in match events (`Buy = 0`, `Sell = 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Side {
    /// Bid
    #[default]
    Buy,
    /// Ask
    Sell,
}

impl Side {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        [Side::Buy, Side::Sell].get(usize::from(raw)).copied()
    }

    /// The side a market order on `self` consumes
    pub fn opposite(self) -> Self {
        if self == Side::Buy {
            Side::Sell
        } else {
            Side::Buy
        }
    }
}

/// Limit orders rest at their price; market orders consume resting
/// liquidity immediately. No other kinds exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

/// A single order and its mutable fill state.
///
/// `remaining` only ever decreases, and only through [`Order::fill`].
///
/// ```
/// use exchange_core::types::{Order, Side};
///
/// // Resting bid for 1.0 at 50,000
/// let order = Order::limit(1, 100, Side::Buy, 5_000_000_000_000, 100_000_000);
/// assert_eq!(order.limit_price(), Some(5_000_000_000_000));
/// assert!(!order.is_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub side: Side,
    pub order_type: OrderType,

    /// Limit price in fixed-point; `None` for market orders
    price: Option<u64>,

    /// Original size in fixed-point
    pub size: u64,

    /// Remaining size, decremented by fills
    remaining: u64,

    /// Creation sequence number (FIFO tie-break).
    /// Zero until the book accepts the order.
    pub sequence: u64,
}

impl Order {
    /// Limit order resting at `price`
    pub fn limit(id: OrderId, user_id: UserId, side: Side, price: u64, size: u64) -> Self {
        Self::new(id, user_id, side, OrderType::Limit, Some(price), size)
    }

    /// Market order; carries no price
    pub fn market(id: OrderId, user_id: UserId, side: Side, size: u64) -> Self {
        Self::new(id, user_id, side, OrderType::Market, None, size)
    }

    fn new(
        id: OrderId,
        user_id: UserId,
        side: Side,
        order_type: OrderType,
        price: Option<u64>,
        size: u64,
    ) -> Self {
        Self {
            id,
            user_id,
            side,
            order_type,
            price,
            size,
            remaining: size,
            sequence: 0,
        }
    }

    /// Assign the next process-wide sequence number.
    ///
    /// The book calls this while holding its lock, so sequence order matches
    /// queue order within a book and stays strictly increasing across books.
    pub(crate) fn stamp(&mut self) {
        self.sequence = next_sequence();
    }

    /// Limit price, or `None` for market orders
    #[inline]
    pub fn limit_price(&self) -> Option<u64> {
        self.price
    }

    /// Size still open for matching
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Size already executed
    pub fn filled_size(&self) -> u64 {
        self.size - self.remaining
    }

    /// Execute `amount` against this order.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidFill`] if `amount` exceeds the remaining size.
    /// The order is left untouched in that case.
    pub fn fill(&mut self, amount: u64) -> Result<(), BookError> {
        if amount > self.remaining {
            return Err(BookError::InvalidFill {
                order_id: self.id,
                requested: amount,
                remaining: self.remaining,
            });
        }
        self.remaining -= amount;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_byte_encoding() {
        for side in [Side::Buy, Side::Sell] {
            assert_eq!(Side::from_u8(side.to_u8()), Some(side));
        }
        assert_eq!(Side::Sell.to_u8(), 1);
        assert_eq!(Side::from_u8(7), None);
    }

    #[test]
    fn test_market_orders_consume_the_other_side() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite().opposite(), Side::Sell);
    }

    #[test]
    fn test_limit_constructor() {
        let order = Order::limit(11, 4, Side::Sell, 200_150_000_000, 150_000_000);

        assert_eq!((order.id, order.user_id, order.side), (11, 4, Side::Sell));
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.limit_price(), Some(200_150_000_000));
        assert_eq!(order.remaining(), order.size);
        assert_eq!(order.filled_size(), 0);
        assert_eq!(order.sequence, 0);
    }

    #[test]
    fn test_market_constructor() {
        let order = Order::market(12, 4, Side::Buy, 10);

        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.limit_price(), None);
        assert_eq!(order.remaining(), 10);
    }

    #[test]
    fn test_stamp_is_strictly_increasing() {
        let mut orders = [
            Order::limit(1, 1, Side::Buy, 100, 1),
            Order::market(2, 1, Side::Sell, 1),
            Order::limit(3, 1, Side::Sell, 50, 1),
        ];
        for order in orders.iter_mut() {
            order.stamp();
        }

        assert!(orders.windows(2).all(|pair| pair[0].sequence < pair[1].sequence));
    }

    #[test]
    fn test_fills_accumulate_to_zero() {
        let mut order = Order::limit(5, 2, Side::Buy, 1_000, 9);

        order.fill(4).unwrap();
        assert_eq!((order.remaining(), order.filled_size()), (5, 4));
        order.fill(0).unwrap();
        assert_eq!(order.remaining(), 5);
        order.fill(5).unwrap();
        assert!(order.is_filled());
        assert_eq!(order.filled_size(), 9);
    }

    #[test]
    fn test_overfill_is_rejected_without_clamping() {
        let mut order = Order::limit(7, 2, Side::Buy, 1_000, 3);
        order.fill(1).unwrap();

        assert_eq!(
            order.fill(3),
            Err(BookError::InvalidFill { order_id: 7, requested: 3, remaining: 2 })
        );
        assert_eq!(order.remaining(), 2);
    }
}
