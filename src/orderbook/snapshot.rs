//! Immutable views of book state.
//!
//! A snapshot owns plain copies of everything it shows, so it can be handed
//! to a broadcaster after the book lock is released.
//!
//! ## Digest
//!
//! [`BookSnapshot::digest`] hashes a canonical little-endian encoding of the
//! snapshot with SHA-256. Two books in the same state produce the same digest,
//! which makes "nothing changed" cheap to assert.

use serde::Serialize;
use sha2::{Digest, Sha256};
use slab::Slab;

use crate::orderbook::level::PriceLevel;
use crate::orderbook::node::OrderNode;
use crate::types::{OrderId, Side, UserId};

/// One resting order as seen by external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub user_id: UserId,
    pub side: Side,
    pub price: u64,
    pub size: u64,
    pub remaining: u64,
    pub sequence: u64,
}

/// One price level, orders oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSnapshot {
    pub price: u64,
    pub volume: u64,
    pub orders: Vec<OrderSnapshot>,
}

impl LevelSnapshot {
    pub(crate) fn capture(level: &PriceLevel, slab: &Slab<OrderNode>) -> Self {
        let orders = level
            .iter(slab)
            .map(|node| OrderSnapshot {
                id: node.order_id(),
                user_id: node.order.user_id,
                side: level.side,
                price: level.price,
                size: node.order.size,
                remaining: node.remaining(),
                sequence: node.order.sequence,
            })
            .collect();

        Self {
            price: level.price,
            volume: level.total_volume,
            orders,
        }
    }
}

/// Both sides of a book, best price first on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookSnapshot {
    /// Bid levels, highest price first
    pub bids: Vec<LevelSnapshot>,

    /// Ask levels, lowest price first
    pub asks: Vec<LevelSnapshot>,

    pub bid_volume: u64,
    pub ask_volume: u64,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<u64> {
        self.asks.first().map(|level| level.price)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total number of resting orders
    pub fn order_count(&self) -> usize {
        self.bids
            .iter()
            .chain(&self.asks)
            .map(|level| level.orders.len())
            .sum()
    }

    /// SHA-256 over the canonical encoding of this snapshot
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        for (tag, levels) in [(b'B', &self.bids), (b'A', &self.asks)] {
            hasher.update([tag]);
            hasher.update((levels.len() as u64).to_le_bytes());
            for level in levels {
                hasher.update(level.price.to_le_bytes());
                hasher.update(level.volume.to_le_bytes());
                hasher.update((level.orders.len() as u64).to_le_bytes());
                for order in &level.orders {
                    hasher.update(order.id.to_le_bytes());
                    hasher.update(order.user_id.to_le_bytes());
                    hasher.update(order.size.to_le_bytes());
                    hasher.update(order.remaining.to_le_bytes());
                    hasher.update(order.sequence.to_le_bytes());
                }
            }
        }
        hasher.update(self.bid_volume.to_le_bytes());
        hasher.update(self.ask_volume.to_le_bytes());

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }

    /// Get the digest as a hex string
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}
