//! The shared latency tracker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use educe::Educe;
use tracing::{debug, trace};

use crate::config::{TrackerConfig, TrackerConfigBuilder};
use crate::err::{Error, Result};
use crate::history::History;
use crate::policy::{TailPercentile, TimeoutPolicy};

/// Tracks recent operation latencies and recommends a timeout for the next
/// operation.
///
/// A `LatencyTracker` is meant to be built once and shared (typically
/// behind an [`Arc`]) by everything that performs the operation being timed.
/// Callers report each completed operation with [`observe`](Self::observe),
/// including operations that timed out, and ask for a timeout with
/// [`timeout`](Self::timeout) before starting the next one.
///
/// Until it has seen enough observations, the tracker is conservative: its
/// history starts out filled with the configured maximum timeout.
#[derive(Educe)]
#[educe(Debug)]
pub struct LatencyTracker {
    /// Our bounds and capacity.
    config: TrackerConfig,
    /// The policy we use to turn a history into a timeout.
    #[educe(Debug(ignore))]
    policy: Arc<dyn TimeoutPolicy>,
    /// The most recent latencies we've observed.
    ///
    /// This lock is never held while `policy` is running.
    history: Mutex<History>,
}

impl LatencyTracker {
    /// Construct a new tracker from `config`, using the default
    /// [`TailPercentile`] policy.
    pub fn new(config: TrackerConfig) -> Self {
        Self::from_parts(config, Arc::new(TailPercentile::default()))
    }

    /// Construct a new tracker from `config` and a custom `policy`.
    pub fn with_policy<P: TimeoutPolicy + 'static>(config: TrackerConfig, policy: P) -> Self {
        Self::from_parts(config, Arc::new(policy))
    }

    /// Return a new [`LatencyTrackerBuilder`].
    pub fn builder() -> LatencyTrackerBuilder {
        LatencyTrackerBuilder::default()
    }

    /// Construct a new tracker from a validated configuration and a policy.
    fn from_parts(config: TrackerConfig, policy: Arc<dyn TimeoutPolicy>) -> Self {
        debug!(
            "New latency tracker: timeouts between {:?} and {:?}, remembering {} observations",
            config.min_timeout(),
            config.max_timeout(),
            config.max_history()
        );
        let history = History::new(config.max_history(), config.max_timeout());
        Self {
            config,
            policy,
            history: Mutex::new(history),
        }
    }

    /// Lock our history.
    ///
    /// No code path can panic while holding this lock, but if one ever did,
    /// the history would still be consistent, so we ignore poisoning.
    fn lock_history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that an operation took `latency` to complete (or to time out).
    ///
    /// This replaces the oldest latency in our history.
    pub fn observe(&self, latency: Duration) {
        self.lock_history().record(latency);
    }

    /// Record that an operation which began at `start` has just completed.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed());
    }

    /// Return the timeout we currently recommend for an operation.
    ///
    /// The result is always between the configured minimum and maximum
    /// timeouts, no matter what the policy returns.
    pub fn timeout(&self) -> Duration {
        let mut snapshot = self.lock_history().snapshot();

        let estimate = self.policy.derive_timeout(&mut snapshot);
        let timeout = self.config.clamp(estimate);
        if timeout != estimate {
            trace!("Clamped timeout estimate {:?} to {:?}", estimate, timeout);
        }
        timeout
    }

    /// Return a copy of our latency history, in slot order.
    ///
    /// Once the history has wrapped around, slot order is not the order in
    /// which the latencies were observed.
    pub fn history(&self) -> Vec<Duration> {
        self.lock_history().snapshot()
    }

    /// Return the configuration this tracker was built with.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

/// A builder for a [`LatencyTracker`].
///
/// Every setting has a default; see [`TrackerConfig`] for the bounds and
/// capacity, and [`TailPercentile`] for the default policy.  Setting the same
/// option twice keeps the later value.
#[derive(Clone, Educe)]
#[educe(Debug)]
pub struct LatencyTrackerBuilder {
    /// Bounds and capacity for the tracker.
    config: TrackerConfigBuilder,
    /// The policy to use, if any.
    #[educe(Debug(ignore))]
    policy: Option<Arc<dyn TimeoutPolicy>>,
}

impl Default for LatencyTrackerBuilder {
    fn default() -> Self {
        Self {
            config: TrackerConfigBuilder::default(),
            policy: Some(Arc::new(TailPercentile::default())),
        }
    }
}

impl From<TrackerConfigBuilder> for LatencyTrackerBuilder {
    fn from(config: TrackerConfigBuilder) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

impl LatencyTrackerBuilder {
    /// Set the smallest timeout the tracker will recommend.
    pub fn min_timeout(&mut self, min_timeout: Duration) -> &mut Self {
        self.config.min_timeout(min_timeout);
        self
    }

    /// Set the largest timeout the tracker will recommend.
    pub fn max_timeout(&mut self, max_timeout: Duration) -> &mut Self {
        self.config.max_timeout(max_timeout);
        self
    }

    /// Set how many recent observations the tracker remembers.
    pub fn max_history(&mut self, max_history: usize) -> &mut Self {
        self.config.max_history(max_history);
        self
    }

    /// Return a mutable reference to the builder for the tracker's
    /// [`TrackerConfig`].
    pub fn config(&mut self) -> &mut TrackerConfigBuilder {
        &mut self.config
    }

    /// Set the policy used to derive a timeout from the latency history.
    pub fn policy<P: TimeoutPolicy + 'static>(&mut self, policy: P) -> &mut Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Replace the policy with `policy`, which may be shared with other
    /// trackers.
    ///
    /// Passing `None` leaves the builder without a policy, and
    /// [`build`](Self::build) will fail until one is provided.
    pub fn set_policy(&mut self, policy: Option<Arc<dyn TimeoutPolicy>>) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Try to construct a [`LatencyTracker`] from this builder.
    pub fn build(&self) -> Result<LatencyTracker> {
        let config = self.config.build()?;
        let policy = self.policy.clone().ok_or(Error::MissingPolicy)?;
        Ok(LatencyTracker::from_parts(config, policy))
    }
}
