//! Limit order book for a single instrument.
//!
//! ## Architecture
//!
//! The book uses a hybrid data structure:
//!
//! - **Slab**: arena owning every resting order (by value, one slot each)
//! - **BTreeMap**: sorted price levels per side for best-price queries and
//!   price-ordered sweeps
//! - **HashMap**: order id to slab key for O(1) cancel
//!
//! Levels and the id index hold slab keys only; nothing else owns an order.
//!
//! ## Price Ordering
//!
//! - **Bids** (buy orders): Sorted high-to-low (best bid = highest price)
//! - **Asks** (sell orders): Sorted low-to-high (best ask = lowest price)
//!
//! ## Matching Policy
//!
//! - Limit orders always rest, even when they cross the opposite side.
//! - Market orders are all-or-nothing: opposing volume is checked before any
//!   fill, and a shortfall leaves the book untouched.
//!
//! ## Example
//!
//! ```
//! use exchange_core::orderbook::OrderBook;
//! use exchange_core::types::{Order, Side};
//!
//! let mut book = OrderBook::with_capacity(1_000);
//!
//! book.place_limit(Order::limit(1, 100, Side::Sell, 10_000, 20)).unwrap();
//! let events = book.place_market(Order::market(2, 200, Side::Buy, 10)).unwrap();
//!
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].execution_price, 10_000);
//! assert_eq!(book.ask_volume(), 10);
//! ```

use std::cmp::Reverse;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use slab::Slab;
use tracing::{debug, error, warn};

use crate::error::BookError;
use crate::orderbook::level::PriceLevel;
use crate::orderbook::node::{LevelKey, OrderNode};
use crate::orderbook::snapshot::{BookSnapshot, LevelSnapshot};
use crate::types::{MatchEvent, Order, OrderId, OrderType, Side};

/// Limit order book: two sides of price levels plus an id index.
#[derive(Debug)]
pub struct OrderBook {
    /// Arena of resting orders
    /// Key: slab index, Value: OrderNode
    orders: Slab<OrderNode>,

    /// Bid price levels (sorted high to low)
    /// Key: Reverse(price) for descending order
    bids: BTreeMap<Reverse<u64>, PriceLevel>,

    /// Ask price levels (sorted low to high)
    asks: BTreeMap<u64, PriceLevel>,

    /// Order ID to slab key mapping (for O(1) cancel)
    order_index: HashMap<OrderId, usize>,

    /// Sum of remaining size over all bid levels
    bid_volume: u64,

    /// Sum of remaining size over all ask levels
    ask_volume: u64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a book with room for `order_capacity` resting orders
    ///
    /// ```
    /// use exchange_core::orderbook::OrderBook;
    ///
    /// let book = OrderBook::with_capacity(100_000);
    /// assert!(book.capacity() >= 100_000);
    /// ```
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_index: HashMap::with_capacity(order_capacity),
            bid_volume: 0,
            ask_volume: 0,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Get the current capacity (pre-allocated slots)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.orders.capacity()
    }

    /// Number of resting orders on both sides
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of bid price levels
    #[inline]
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get the number of ask price levels
    #[inline]
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Rest a limit order at its price.
    ///
    /// Creates the level on first use and appends the order to its FIFO queue.
    /// Never matches, even if the price crosses the opposite side.
    ///
    /// # Errors
    ///
    /// `ZeroSize`, `MissingPrice`, `ZeroPrice`, `DuplicateOrder` or
    /// `VolumeOverflow`; the book is unchanged on error.
    pub fn place_limit(&mut self, mut order: Order) -> Result<OrderId, BookError> {
        if order.size == 0 {
            return Err(BookError::ZeroSize);
        }
        let price = match (order.order_type, order.limit_price()) {
            (OrderType::Limit, Some(0)) => return Err(BookError::ZeroPrice),
            (OrderType::Limit, Some(price)) => price,
            _ => return Err(BookError::MissingPrice),
        };
        if self.order_index.contains_key(&order.id) {
            return Err(BookError::DuplicateOrder(order.id));
        }
        // A level never holds more than its side, so this bounds both totals
        let resting = self.volume(order.side);
        if resting.checked_add(order.size).is_none() {
            warn!(order_id = order.id, side = ?order.side, resting, size = order.size, "limit order rejected");
            return Err(BookError::VolumeOverflow { side: order.side, resting, size: order.size });
        }

        order.stamp();
        let order_id = order.id;
        let side = order.side;
        let size = order.remaining();

        let key = self.orders.insert(OrderNode::new(order));
        self.order_index.insert(order_id, key);

        match side {
            Side::Buy => {
                self.bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(Side::Buy, price))
                    .add(key, &mut self.orders);
                self.bid_volume += size;
            }
            Side::Sell => {
                self.asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(Side::Sell, price))
                    .add(key, &mut self.orders);
                self.ask_volume += size;
            }
        }

        debug!(order_id, ?side, price, size, "limit order resting");
        Ok(order_id)
    }

    /// Execute a market order against the opposite side.
    ///
    /// Buys sweep asks from the lowest price up, sells sweep bids from the
    /// highest price down. Levels emptied by the sweep are de-indexed
    /// immediately. Returns the fills in execution order.
    ///
    /// # Errors
    ///
    /// `InsufficientLiquidity` if the opposite side holds less than the
    /// order's size. The check runs before any fill, so the book is unchanged.
    pub fn place_market(&mut self, mut order: Order) -> Result<Vec<MatchEvent>, BookError> {
        let requested = order.remaining();
        if requested == 0 {
            return Err(BookError::ZeroSize);
        }

        let available = self.volume(order.side.opposite());
        if requested > available {
            warn!(order_id = order.id, requested, available, "market order rejected");
            return Err(BookError::InsufficientLiquidity { requested, available });
        }

        order.stamp();
        let swept = match order.side {
            Side::Buy => Self::sweep(&mut self.asks, &mut self.orders, &mut self.order_index, &mut order),
            Side::Sell => Self::sweep(&mut self.bids, &mut self.orders, &mut self.order_index, &mut order),
        };
        let events = swept.map_err(|err| {
            error!(order_id = order.id, %err, "matching invariant violated");
            err
        })?;

        let filled: u64 = events.iter().map(|event| event.filled_size).sum();
        match order.side {
            Side::Buy => self.ask_volume -= filled,
            Side::Sell => self.bid_volume -= filled,
        }

        debug!(order_id = order.id, side = ?order.side, filled, fills = events.len(), "market order executed");
        Ok(events)
    }

    /// Cancel a resting order by id, returning it.
    ///
    /// The order leaves its level (and the level leaves the book if emptied)
    /// and the id index. A second cancel of the same id fails.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Order, BookError> {
        let key = self
            .order_index
            .remove(&order_id)
            .ok_or(BookError::OrderNotFound(order_id))?;

        if let Some(level_key) = self.orders.get(key).and_then(|node| node.level) {
            self.detach(key, level_key);
        }

        let node = self
            .orders
            .try_remove(key)
            .ok_or(BookError::OrderNotFound(order_id))?;

        debug!(order_id, remaining = node.remaining(), "order cancelled");
        Ok(node.order)
    }

    /// Remove every order from the book
    pub fn clear(&mut self) {
        self.orders.clear();
        self.bids.clear();
        self.asks.clear();
        self.order_index.clear();
        self.bid_volume = 0;
        self.ask_volume = 0;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get the best bid price (highest buy price)
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Get the best ask price (lowest sell price)
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    /// Get the spread (best_ask - best_bid)
    ///
    /// `None` if either side is empty or the book is crossed.
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask >= bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Total resting bid size
    #[inline]
    pub fn bid_volume(&self) -> u64 {
        self.bid_volume
    }

    /// Total resting ask size
    #[inline]
    pub fn ask_volume(&self) -> u64 {
        self.ask_volume
    }

    /// Total resting size on one side
    #[inline]
    pub fn volume(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.bid_volume,
            Side::Sell => self.ask_volume,
        }
    }

    /// Get the best bid price level
    pub fn best_bid_level(&self) -> Option<&PriceLevel> {
        self.bids.values().next()
    }

    /// Get the best ask price level
    pub fn best_ask_level(&self) -> Option<&PriceLevel> {
        self.asks.values().next()
    }

    /// Look up the level at `price` on `side`
    pub fn level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        match side {
            Side::Buy => self.bids.get(&Reverse(price)),
            Side::Sell => self.asks.get(&price),
        }
    }

    /// Look up a resting order by id
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        let key = self.order_index.get(&order_id)?;
        self.orders.get(*key).map(|node| &node.order)
    }

    /// Check if an order is resting in the book
    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.order_index.contains_key(&order_id)
    }

    /// Ids of the orders at one level, oldest first
    pub fn queue(&self, side: Side, price: u64) -> Vec<OrderId> {
        self.level(side, price)
            .map(|level| level.iter(&self.orders).map(OrderNode::order_id).collect())
            .unwrap_or_default()
    }

    /// Copy out both sides, best price first
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self
                .bids
                .values()
                .map(|level| LevelSnapshot::capture(level, &self.orders))
                .collect(),
            asks: self
                .asks
                .values()
                .map(|level| LevelSnapshot::capture(level, &self.orders))
                .collect(),
            bid_volume: self.bid_volume,
            ask_volume: self.ask_volume,
        }
    }

    /// Walk every index and confirm they agree with each other.
    ///
    /// Checks level volumes against member sums, side totals against level
    /// volumes, absence of empty levels, back-references, and that the id
    /// index and the level queues cover exactly the same orders.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut linked = 0usize;

        for (side, levels, side_volume) in [
            (Side::Buy, self.bids.values().collect::<Vec<_>>(), self.bid_volume),
            (Side::Sell, self.asks.values().collect::<Vec<_>>(), self.ask_volume),
        ] {
            let mut total = 0u64;
            for level in levels {
                if level.is_empty() {
                    return Err(format!("empty {:?} level at {} still indexed", side, level.price));
                }
                let mut members = 0usize;
                let mut volume = 0u64;
                for node in level.iter(&self.orders) {
                    if node.level != Some(level.key()) {
                        return Err(format!("order {} has stale level reference", node.order_id()));
                    }
                    if self.order_index.get(&node.order_id()).is_none() {
                        return Err(format!("order {} missing from id index", node.order_id()));
                    }
                    members += 1;
                    volume = volume
                        .checked_add(node.remaining())
                        .ok_or_else(|| format!("{:?} level {} volume overflows u64", side, level.price))?;
                }
                if members != level.order_count || volume != level.total_volume {
                    return Err(format!(
                        "{:?} level {}: {} orders / {} volume recorded, {} / {} found",
                        side, level.price, level.order_count, level.total_volume, members, volume
                    ));
                }
                linked += members;
                total = total
                    .checked_add(volume)
                    .ok_or_else(|| format!("{:?} side volume overflows u64", side))?;
            }
            if total != side_volume {
                return Err(format!("{:?} volume {} recorded, {} found", side, side_volume, total));
            }
        }

        if linked != self.order_index.len() || linked != self.orders.len() {
            return Err(format!(
                "{} orders linked, {} indexed, {} stored",
                linked,
                self.order_index.len(),
                self.orders.len()
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Consume levels in map order until the aggressor is filled.
    fn sweep<K: Ord>(
        levels: &mut BTreeMap<K, PriceLevel>,
        orders: &mut Slab<OrderNode>,
        order_index: &mut HashMap<OrderId, usize>,
        aggressor: &mut Order,
    ) -> Result<Vec<MatchEvent>, BookError> {
        let mut events = Vec::new();

        while !aggressor.is_filled() {
            let Some(mut entry) = levels.first_entry() else {
                break;
            };

            let fill = entry.get_mut().fill_against(aggressor, orders)?;
            for key in fill.filled {
                if let Some(node) = orders.try_remove(key) {
                    order_index.remove(&node.order_id());
                }
            }
            events.extend(fill.events);

            if entry.get().is_empty() {
                entry.remove();
            }
        }

        Ok(events)
    }

    /// Unlink `key` from the level named by `level_key`, dropping the level
    /// if it empties.
    fn detach(&mut self, key: usize, level_key: LevelKey) {
        match level_key.side {
            Side::Buy => Self::detach_from(
                &mut self.bids,
                Reverse(level_key.price),
                key,
                &mut self.orders,
                &mut self.bid_volume,
            ),
            Side::Sell => Self::detach_from(
                &mut self.asks,
                level_key.price,
                key,
                &mut self.orders,
                &mut self.ask_volume,
            ),
        }
    }

    fn detach_from<K: Ord>(
        levels: &mut BTreeMap<K, PriceLevel>,
        price_key: K,
        key: usize,
        orders: &mut Slab<OrderNode>,
        side_volume: &mut u64,
    ) {
        if let Entry::Occupied(mut entry) = levels.entry(price_key) {
            if let Some(removed) = entry.get_mut().remove(key, orders) {
                *side_volume -= removed;
            }
            if entry.get().is_empty() {
                entry.remove();
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
