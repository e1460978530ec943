//! Settlement collaborator.
//!
//! Settlement moves value between the two users of a fill. It runs after the
//! book lock is released and the book never waits on its outcome.

use tracing::info;

use crate::error::SettlementError;
use crate::types::price::{from_fixed_trimmed, notional};
use crate::types::{Market, MatchEvent};

/// Transfers value for each fill.
pub trait Settlement: Send + Sync {
    /// Move `event.filled_size` of the base asset from seller to buyer and the
    /// quote amount the other way.
    fn transfer(&self, market: &Market, event: &MatchEvent) -> Result<(), SettlementError>;
}

/// Settlement that only records transfers in the log.
///
/// Encodes each event first so malformed events surface here the same way
/// they would on a real settlement channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSettlement;

impl Settlement for LoggingSettlement {
    fn transfer(&self, market: &Market, event: &MatchEvent) -> Result<(), SettlementError> {
        let encoded = event.encode()?;
        let quote = notional(event.execution_price, event.filled_size)
            .map(from_fixed_trimmed)
            .unwrap_or_else(|| "overflow".to_string());

        info!(
            %market,
            seller = event.seller(),
            buyer = event.buyer(),
            size = %from_fixed_trimmed(event.filled_size),
            price = %from_fixed_trimmed(event.execution_price),
            quote = %quote,
            bytes = encoded.len(),
            "settlement transfer"
        );
        Ok(())
    }
}
