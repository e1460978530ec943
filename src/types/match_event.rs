//! Match event: one fill between a resting order and an aggressor.
//!
//! ## SSZ Serialization
//!
//! Events are handed to the settlement collaborator after the book lock is
//! released. SSZ gives them a fixed, deterministic encoding.

use ssz_rs::prelude::*;

use crate::error::SettlementError;
use crate::types::{OrderId, Side, UserId};

/// A single execution produced by the matching walk.
///
/// ## Price Discovery
///
/// The event always executes at the resting order's price: the resting side
/// sets the price, the aggressor accepts it.
///
/// ## Example
///
/// ```
/// use exchange_core::types::{MatchEvent, Side};
///
/// let event = MatchEvent::new(
///     10,          // resting_order_id
///     11,          // aggressor_order_id
///     100,         // resting_user
///     200,         // aggressor_user
///     Side::Buy,   // aggressor side
///     10,          // filled_size
///     10_000,      // execution_price
/// );
/// assert_eq!(event.buyer(), 200);
/// assert_eq!(event.seller(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct MatchEvent {
    /// Resting (maker) order ID
    pub resting_order_id: u64,

    /// Aggressor (taker) order ID
    pub aggressor_order_id: u64,

    /// Resting order's owner
    pub resting_user: u64,

    /// Aggressor's owner
    pub aggressor_user: u64,

    /// Aggressor side as u8 (0=Buy, 1=Sell)
    pub aggressor_side_raw: u8,

    /// Executed size in fixed-point
    pub filled_size: u64,

    /// Execution price in fixed-point (always the resting price)
    pub execution_price: u64,
}

impl MatchEvent {
    pub fn new(
        resting_order_id: OrderId,
        aggressor_order_id: OrderId,
        resting_user: UserId,
        aggressor_user: UserId,
        aggressor_side: Side,
        filled_size: u64,
        execution_price: u64,
    ) -> Self {
        Self {
            resting_order_id,
            aggressor_order_id,
            resting_user,
            aggressor_user,
            aggressor_side_raw: aggressor_side.to_u8(),
            filled_size,
            execution_price,
        }
    }

    /// Side of the incoming order
    pub fn aggressor_side(&self) -> Side {
        Side::from_u8(self.aggressor_side_raw).unwrap_or_default()
    }

    /// User receiving the asset
    pub fn buyer(&self) -> UserId {
        match self.aggressor_side() {
            Side::Buy => self.aggressor_user,
            Side::Sell => self.resting_user,
        }
    }

    /// User delivering the asset
    pub fn seller(&self) -> UserId {
        match self.aggressor_side() {
            Side::Buy => self.resting_user,
            Side::Sell => self.aggressor_user,
        }
    }

    /// Notional value (price * size), scaled by 10^16.
    pub fn notional_raw(&self) -> u128 {
        (self.execution_price as u128) * (self.filled_size as u128)
    }

    /// Deterministic SSZ encoding for the settlement hand-off
    pub fn encode(&self) -> Result<Vec<u8>, SettlementError> {
        ssz_rs::serialize(self).map_err(|e| SettlementError::Encoding(e.to_string()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
