//! Arena slot for a resting order.
//!
//! Each slot carries the order itself, the key of the level it joined and
//! the slab keys of its queue neighbours. Nothing here is a reference: a
//! level is always found again through the book's price maps, so a slot can
//! never point at a level that no longer exists.
//!
//! Slab keys are recycled after removal and never leave the book; callers
//! address orders by `OrderId` only.

use crate::types::{Order, OrderId, Side};

/// Where a level lives: the side map and the price within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelKey {
    pub side: Side,
    pub price: u64,
}

impl LevelKey {
    pub fn new(side: Side, price: u64) -> Self {
        Self { side, price }
    }
}

/// A resting order plus its queue links.
///
/// ```text
///            prev                next
///   older <-------- OrderNode --------> newer
///                      |
///                    level: LevelKey { side, price }
/// ```
#[derive(Debug, Clone)]
pub struct OrderNode {
    pub order: Order,

    /// Set when the order joins a level, cleared when it leaves
    pub level: Option<LevelKey>,

    /// Newer neighbour; `None` at the tail
    pub next: Option<usize>,

    /// Older neighbour; `None` at the head
    pub prev: Option<usize>,
}

impl OrderNode {
    /// Wrap an order that has not joined any level yet
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            level: None,
            next: None,
            prev: None,
        }
    }

    #[inline]
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.order.remaining()
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.order.is_filled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_node_is_unlinked() {
        let node = OrderNode::new(Order::limit(9, 3, Side::Sell, 2_000, 4));

        assert_eq!(node.order_id(), 9);
        assert_eq!(node.remaining(), 4);
        assert_eq!(node.level, None);
        assert_eq!((node.prev, node.next), (None, None));
        assert!(!node.is_filled());
    }

    #[test]
    fn test_node_tracks_fills() {
        let mut node = OrderNode::new(Order::limit(9, 3, Side::Sell, 2_000, 4));
        node.order.fill(4).unwrap();
        assert!(node.is_filled());
        assert_eq!(node.remaining(), 0);
    }

    #[test]
    fn test_level_key_distinguishes_sides() {
        assert_eq!(LevelKey::new(Side::Buy, 100), LevelKey::new(Side::Buy, 100));
        assert_ne!(LevelKey::new(Side::Buy, 100), LevelKey::new(Side::Sell, 100));
        assert_ne!(LevelKey::new(Side::Buy, 100), LevelKey::new(Side::Buy, 101));
    }
}
