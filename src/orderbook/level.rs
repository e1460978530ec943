//! One price on one side of the book.
//!
//! Members form an intrusive FIFO of slab keys:
//!
//! ```text
//! head ──next──> ... ──next──> tail
//! (oldest)                  (newest)
//! ```
//!
//! Arrivals join at the tail and matching takes from the head, so queue
//! order is arrival order. Removal by slab key is O(1) from anywhere in the
//! queue. `total_volume` tracks the sum of member remaining sizes through
//! every mutation below.

use slab::Slab;

use crate::error::BookError;
use crate::orderbook::node::{LevelKey, OrderNode};
use crate::types::{MatchEvent, Order, Side};

/// Outcome of sweeping one level with an aggressor.
#[derive(Debug, Default)]
pub struct LevelFill {
    /// Fills in execution order (oldest resting order first)
    pub events: Vec<MatchEvent>,

    /// Slab keys of resting orders that were fully consumed.
    /// They are already unlinked from the level; the caller owns their removal
    /// from the slab and the id index.
    pub filled: Vec<usize>,
}

/// Queue metadata for one price. Orders themselves live in the book's slab.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub side: Side,
    pub price: u64,

    /// Sum of remaining sizes of all member orders
    pub total_volume: u64,

    /// Oldest member
    pub head: Option<usize>,

    /// Newest member
    pub tail: Option<usize>,

    pub order_count: usize,
}

impl PriceLevel {
    pub fn new(side: Side, price: u64) -> Self {
        Self {
            side,
            price,
            total_volume: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    /// Key other structures use to refer back to this level
    #[inline]
    pub fn key(&self) -> LevelKey {
        LevelKey::new(self.side, self.price)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Join the queue at the tail, recording this level on the node.
    ///
    /// Unknown keys are ignored.
    pub fn add(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let level_key = self.key();
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        let remaining = node.remaining();

        node.level = Some(level_key);
        node.prev = self.tail;
        node.next = None;

        match self.tail.and_then(|tail| slab.get_mut(tail)) {
            Some(tail_node) => tail_node.next = Some(key),
            None => self.head = Some(key),
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_volume += remaining;
    }

    /// Take a member out by slab key and return its remaining size.
    ///
    /// Two members may be equal in every field; only the key identifies
    /// them. `None` if `key` is not a member of this level.
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Option<u64> {
        let node = slab.get(key)?;
        if node.level != Some(self.key()) {
            return None;
        }
        let remaining = node.remaining();
        self.unlink(key, slab);
        self.total_volume -= remaining;
        Some(remaining)
    }

    /// Consume resting orders from the head of the queue to satisfy as much
    /// of `aggressor` as this level can supply.
    ///
    /// Each fill is `min(resting.remaining, aggressor.remaining)` at this
    /// level's price. Fully filled resting orders are unlinked and reported in
    /// [`LevelFill::filled`]. Stops when the aggressor is filled or the queue
    /// is exhausted.
    pub fn fill_against(
        &mut self,
        aggressor: &mut Order,
        slab: &mut Slab<OrderNode>,
    ) -> Result<LevelFill, BookError> {
        let mut fill = LevelFill::default();

        while !aggressor.is_filled() {
            let Some(key) = self.head else {
                break;
            };
            let Some(node) = slab.get_mut(key) else {
                break;
            };

            let delta = node.remaining().min(aggressor.remaining());
            node.order.fill(delta)?;
            aggressor.fill(delta)?;
            self.total_volume -= delta;

            fill.events.push(MatchEvent::new(
                node.order_id(),
                aggressor.id,
                node.order.user_id,
                aggressor.user_id,
                aggressor.side,
                delta,
                self.price,
            ));

            if node.is_filled() {
                self.unlink(key, slab);
                fill.filled.push(key);
            }
        }

        Ok(fill)
    }

    /// Iterate member orders from oldest to newest
    pub fn iter<'a>(&self, slab: &'a Slab<OrderNode>) -> LevelIter<'a> {
        LevelIter {
            slab,
            cursor: self.head,
        }
    }

    /// Splice `key` out of the queue. Volume is the caller's job.
    fn unlink(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        node.level = None;
        let prev_key = node.prev.take();
        let next_key = node.next.take();

        match prev_key.and_then(|prev| slab.get_mut(prev)) {
            Some(prev_node) => prev_node.next = next_key,
            None => self.head = next_key,
        }

        match next_key.and_then(|next| slab.get_mut(next)) {
            Some(next_node) => next_node.prev = prev_key,
            None => self.tail = prev_key,
        }

        self.order_count -= 1;
    }
}

/// Oldest-first iterator over a level's orders.
pub struct LevelIter<'a> {
    slab: &'a Slab<OrderNode>,
    cursor: Option<usize>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a OrderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slab.get(self.cursor?)?;
        self.cursor = node.next;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICE: u64 = 10_000;

    fn push_bid(slab: &mut Slab<OrderNode>, id: u64, size: u64) -> usize {
        let order = Order::limit(id, 100 + id, Side::Buy, PRICE, size);
        slab.insert(OrderNode::new(order))
    }

    fn level_with(slab: &mut Slab<OrderNode>, sizes: &[u64]) -> (PriceLevel, Vec<usize>) {
        let mut level = PriceLevel::new(Side::Buy, PRICE);
        let keys = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let key = push_bid(slab, i as u64 + 1, size);
                level.add(key, slab);
                key
            })
            .collect();
        (level, keys)
    }

    fn member_ids(level: &PriceLevel, slab: &Slab<OrderNode>) -> Vec<u64> {
        level.iter(slab).map(|node| node.order_id()).collect()
    }

    fn summed_volume(level: &PriceLevel, slab: &Slab<OrderNode>) -> u64 {
        level.iter(slab).map(|node| node.remaining()).sum()
    }

    #[test]
    fn test_new_level_is_empty() {
        let level = PriceLevel::new(Side::Sell, PRICE);

        assert_eq!(level.key(), LevelKey::new(Side::Sell, PRICE));
        assert_eq!(level.total_volume, 0);
        assert_eq!((level.head, level.tail), (None, None));
        assert!(level.is_empty());
    }

    #[test]
    fn test_add_sets_back_reference_and_volume() {
        let mut slab = Slab::new();
        let (level, keys) = level_with(&mut slab, &[5, 8, 10]);

        assert_eq!(level.order_count, 3);
        assert_eq!(level.total_volume, 23);
        assert_eq!(level.head, Some(keys[0]));
        assert_eq!(level.tail, Some(keys[2]));
        assert_eq!(member_ids(&level, &slab), vec![1, 2, 3]);

        for key in keys {
            assert_eq!(slab[key].level, Some(level.key()));
        }
    }

    #[test]
    fn test_remove_middle_keeps_fifo() {
        let mut slab = Slab::new();
        let (mut level, keys) = level_with(&mut slab, &[5, 8, 10]);

        assert_eq!(level.remove(keys[1], &mut slab), Some(8));

        assert_eq!(level.order_count, 2);
        assert_eq!(level.total_volume, 15);
        assert_eq!(member_ids(&level, &slab), vec![1, 3]);
        assert_eq!(slab[keys[0]].next, Some(keys[2]));
        assert_eq!(slab[keys[2]].prev, Some(keys[0]));
    }

    #[test]
    fn test_removed_node_forgets_level() {
        let mut slab = Slab::new();
        let (mut level, keys) = level_with(&mut slab, &[2, 3]);

        level.remove(keys[0], &mut slab);
        assert_eq!(slab[keys[0]].level, None);
        // A second removal of the same key is a no-op
        assert_eq!(level.remove(keys[0], &mut slab), None);
        assert_eq!(level.total_volume, 3);
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut slab = Slab::new();
        let (mut level, keys) = level_with(&mut slab, &[1, 2, 3]);

        level.remove(keys[0], &mut slab);
        assert_eq!(level.head, Some(keys[1]));

        level.remove(keys[2], &mut slab);
        assert_eq!(level.tail, Some(keys[1]));
        assert_eq!(level.head, Some(keys[1]));
        assert!(slab[keys[1]].prev.is_none());
        assert!(slab[keys[1]].next.is_none());

        level.remove(keys[1], &mut slab);
        assert!(level.is_empty());
        assert_eq!(level.total_volume, 0);
        assert!(level.head.is_none());
        assert!(level.tail.is_none());
    }

    #[test]
    fn test_remove_identical_orders_by_identity() {
        let mut slab = Slab::new();
        // Same size, same price: only the key tells them apart
        let (mut level, keys) = level_with(&mut slab, &[4, 4]);

        level.remove(keys[1], &mut slab);
        assert_eq!(member_ids(&level, &slab), vec![1]);
    }

    #[test]
    fn test_remove_non_member_is_ignored() {
        let mut slab = Slab::new();
        let (mut level, _) = level_with(&mut slab, &[4]);
        let mut other = PriceLevel::new(Side::Buy, PRICE + 1);
        let stranger = push_bid(&mut slab, 99, 7);
        other.add(stranger, &mut slab);

        assert_eq!(level.remove(stranger, &mut slab), None);
        assert_eq!(level.remove(12345, &mut slab), None);
        assert_eq!(level.total_volume, 4);
        assert_eq!(level.order_count, 1);
    }

    #[test]
    fn test_fill_against_partial_head() {
        let mut slab = Slab::new();
        let (mut level, keys) = level_with(&mut slab, &[20]);
        let mut aggressor = Order::market(50, 7, Side::Sell, 10);

        let fill = level.fill_against(&mut aggressor, &mut slab).unwrap();

        assert_eq!(fill.events.len(), 1);
        assert!(fill.filled.is_empty());
        let event = &fill.events[0];
        assert_eq!(event.resting_order_id, 1);
        assert_eq!(event.aggressor_order_id, 50);
        assert_eq!(event.resting_user, 101);
        assert_eq!(event.aggressor_user, 7);
        assert_eq!(event.filled_size, 10);
        assert_eq!(event.execution_price, PRICE);

        assert!(aggressor.is_filled());
        assert_eq!(slab[keys[0]].remaining(), 10);
        assert_eq!(level.total_volume, 10);
        assert_eq!(level.order_count, 1);
    }

    #[test]
    fn test_fill_against_is_fifo() {
        let mut slab = Slab::new();
        let (mut level, keys) = level_with(&mut slab, &[10, 1, 6]);
        let mut aggressor = Order::market(50, 7, Side::Sell, 12);

        let fill = level.fill_against(&mut aggressor, &mut slab).unwrap();

        let filled: Vec<_> = fill.events.iter().map(|e| (e.resting_order_id, e.filled_size)).collect();
        assert_eq!(filled, vec![(1, 10), (2, 1), (3, 1)]);
        assert_eq!(fill.filled, vec![keys[0], keys[1]]);

        assert_eq!(member_ids(&level, &slab), vec![3]);
        assert_eq!(level.total_volume, 5);
        assert_eq!(level.total_volume, summed_volume(&level, &slab));
    }

    #[test]
    fn test_fill_against_exhausts_level() {
        let mut slab = Slab::new();
        let (mut level, _) = level_with(&mut slab, &[3, 4]);
        let mut aggressor = Order::market(50, 7, Side::Sell, 10);

        let fill = level.fill_against(&mut aggressor, &mut slab).unwrap();

        assert_eq!(fill.events.len(), 2);
        assert_eq!(fill.filled.len(), 2);
        assert!(level.is_empty());
        assert_eq!(level.total_volume, 0);
        assert_eq!(aggressor.remaining(), 3);
    }

    #[test]
    fn test_fill_against_filled_aggressor_is_noop() {
        let mut slab = Slab::new();
        let (mut level, _) = level_with(&mut slab, &[3]);
        let mut aggressor = Order::market(50, 7, Side::Sell, 1);
        aggressor.fill(1).unwrap();

        let fill = level.fill_against(&mut aggressor, &mut slab).unwrap();
        assert!(fill.events.is_empty());
        assert_eq!(level.total_volume, 3);
    }
}
