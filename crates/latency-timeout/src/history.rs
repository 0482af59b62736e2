//! A fixed-capacity ring buffer of observed latencies.

use std::time::Duration;

/// The most recent `capacity` latencies we have observed.
///
/// There is no notion of an "empty" slot: every slot starts out holding a
/// caller-chosen fill value, and each new observation overwrites the
/// oldest slot.  Slots are kept in physical order, which is *not* the order
/// in which they were observed once the buffer has wrapped.
#[derive(Debug, Clone)]
pub(crate) struct History {
    /// The recorded values, in slot order.
    ///
    /// Invariant: never empty.
    slots: Vec<Duration>,
    /// The index of the slot that the next observation will overwrite.
    ///
    /// Invariant: always less than `slots.len()`.
    next: usize,
}

impl History {
    /// Create a new `History` with `capacity` slots, all set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.  Callers validate their configuration
    /// first.
    pub(crate) fn new(capacity: usize, fill: Duration) -> Self {
        assert!(capacity > 0, "History capacity must be positive");
        Self {
            slots: vec![fill; capacity],
            next: 0,
        }
    }

    /// Record `latency`, overwriting the oldest slot.
    pub(crate) fn record(&mut self, latency: Duration) {
        self.slots[self.next] = latency;
        self.next = (self.next + 1) % self.slots.len();
    }

    /// Return a copy of every slot, in slot order.
    pub(crate) fn snapshot(&self) -> Vec<Duration> {
        self.slots.clone()
    }

    /// Return the number of slots.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
