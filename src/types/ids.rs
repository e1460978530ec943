//! Identifier and sequence assignment.
//!
//! Both counters are lock-free so callers can draw ids without holding any
//! book lock. Neither ever hands out the same value twice.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::OrderId;

/// Process-wide creation sequence shared by every order of every book.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Draw the next creation sequence number.
#[inline]
pub fn next_sequence() -> u64 {
    NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// Monotonic order id generator.
///
/// Share one instance (behind an `Arc`) between every book of an exchange so
/// ids stay unique across instruments.
///
/// ```
/// use exchange_core::types::IdGenerator;
///
/// let ids = IdGenerator::new();
/// assert_eq!(ids.next_id(), 1);
/// assert_eq!(ids.next_id(), 2);
/// ```
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator starting at id 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a generator whose first id is `first`
    pub fn starting_at(first: OrderId) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Hand out the next order id
    #[inline]
    pub fn next_id(&self) -> OrderId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Peek at the next id without consuming it
    pub fn peek(&self) -> OrderId {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_are_monotonic() {
        let ids = IdGenerator::starting_at(10);
        assert_eq!(ids.peek(), 10);
        assert_eq!(ids.next_id(), 10);
        assert_eq!(ids.next_id(), 11);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(IdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..1_000).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }

    #[test]
    fn test_sequence_increases() {
        let a = next_sequence();
        let b = next_sequence();
        assert!(b > a);
    }
}
