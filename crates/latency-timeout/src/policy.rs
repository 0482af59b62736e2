//! Policies for turning a history of latencies into a timeout.

use std::time::Duration;

/// An object that recommends a timeout from a history of observed latencies.
///
/// The tracker clamps whatever this returns to its configured bounds, so an
/// implementation doesn't need to worry about producing something too small
/// or too large.
///
/// # Ordering
///
/// The `history` slice is a copy of the tracker's ring buffer in *slot*
/// order, not in the order the latencies were observed.  Implementations
/// must not assume that later entries are more recent.  Slots that have not
/// yet received an observation hold the tracker's maximum timeout.
///
/// The slice belongs to the policy for the duration of the call: it may be
/// sorted or otherwise rearranged without affecting the tracker.  It is
/// never empty when passed by a tracker.
pub trait TimeoutPolicy: Send + Sync {
    /// Return the timeout to recommend, given `history`.
    fn derive_timeout(&self, history: &mut [Duration]) -> Duration;
}

impl<F> TimeoutPolicy for F
where
    F: Fn(&mut [Duration]) -> Duration + Send + Sync,
{
    fn derive_timeout(&self, history: &mut [Duration]) -> Duration {
        self(history)
    }
}

/// The default [`TimeoutPolicy`]: a multiple of some percentile of the
/// observed latencies.
///
/// By default this is three times the 95th percentile.  The multiplier
/// gives a margin above the tail, so that only genuinely slow operations
/// time out.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TailPercentile {
    /// Which percentile to use, from 0 to 100 inclusive.
    percentile: u8,
    /// How much to multiply the chosen latency by.
    multiplier: u32,
}

impl TailPercentile {
    /// Construct a new `TailPercentile`.
    ///
    /// A `percentile` above 100 is treated as 100 (the largest observation).
    pub fn new(percentile: u8, multiplier: u32) -> Self {
        Self {
            percentile: percentile.min(100),
            multiplier,
        }
    }

    /// Return the percentile this policy selects.
    pub fn percentile(&self) -> u8 {
        self.percentile
    }

    /// Return the multiplier this policy applies.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Return the index into a sorted history of length `len` whose value
    /// we should use.
    ///
    /// This is `floor(percentile * len / 100)`, kept below `len`.
    fn index(&self, len: usize) -> usize {
        let idx = len.saturating_mul(usize::from(self.percentile)) / 100;
        idx.min(len.saturating_sub(1))
    }
}

impl Default for TailPercentile {
    fn default() -> Self {
        Self::new(95, 3)
    }
}

impl TimeoutPolicy for TailPercentile {
    fn derive_timeout(&self, history: &mut [Duration]) -> Duration {
        if history.is_empty() {
            return Duration::ZERO;
        }
        history.sort_unstable();
        history[self.index(history.len())].saturating_mul(self.multiplier)
    }
}
