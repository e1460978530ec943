//! Book change notifications.
//!
//! The core only says "the book for market X changed". Serializing the
//! snapshot and delivering it to subscribers is the receiver's job, and the
//! signal must never block the caller.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::types::Market;

/// Receives a signal after every successful placement or cancellation.
pub trait BookListener: Send + Sync {
    fn book_changed(&self, market: &Market);
}

/// Listener that ignores every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl BookListener for NoopListener {
    fn book_changed(&self, _market: &Market) {}
}

/// Listener backed by a bounded channel.
///
/// Uses `try_send`: when the consumer falls behind and the channel is full,
/// the signal is dropped. A later change re-signals the same market, and the
/// consumer always reads the latest snapshot.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<Market>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the broadcaster
    pub fn bounded(capacity: usize) -> (Self, Receiver<Market>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl BookListener for ChannelNotifier {
    fn book_changed(&self, market: &Market) {
        match self.tx.try_send(market.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(market)) => {
                warn!(%market, "book change notification dropped, channel full");
            }
            Err(TrySendError::Disconnected(market)) => {
                debug!(%market, "no broadcaster attached");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_delivers() {
        let (notifier, rx) = ChannelNotifier::bounded(4);
        notifier.book_changed(&Market::new("ETH-USD"));
        notifier.book_changed(&Market::new("BTC-USD"));

        assert_eq!(rx.try_recv().unwrap(), Market::new("ETH-USD"));
        assert_eq!(rx.try_recv().unwrap(), Market::new("BTC-USD"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let (notifier, rx) = ChannelNotifier::bounded(1);
        let market = Market::new("ETH-USD");

        notifier.book_changed(&market);
        notifier.book_changed(&market);
        notifier.book_changed(&market);

        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_disconnected_channel_is_ignored() {
        let (notifier, rx) = ChannelNotifier::bounded(1);
        drop(rx);
        notifier.book_changed(&Market::new("ETH-USD"));
    }
}
