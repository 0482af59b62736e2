//! Configuration for a [`LatencyTracker`](crate::LatencyTracker).
//!
//! A [`TrackerConfig`] holds the bounds within which every recommended
//! timeout must fall, and the number of observations the tracker remembers.
//! The timeout policy itself is not part of this type, since it can't be
//! serialized; see [`LatencyTrackerBuilder`](crate::LatencyTrackerBuilder).

use std::time::Duration;

use derive_builder::Builder;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};

use crate::err::Error;

/// Bounds and capacity for a latency tracker.
///
/// This type is immutable once constructed.  To make one, use
/// [`TrackerConfigBuilder`], or deserialize a builder from a string and
/// call [`build`](TrackerConfigBuilder::build) on it.
///
/// Every field is optional.  Durations are written in humantime format, so
/// a TOML section might look like this:
///
/// ```toml
/// min_timeout = "50 ms"
/// max_timeout = "2 s"
/// max_history = 500
/// ```
#[derive(Debug, Clone, Builder, Eq, PartialEq, CopyGetters)]
#[builder(build_fn(validate = "Self::validate", error = "Error"))]
#[builder(derive(Debug, Serialize, Deserialize))]
#[non_exhaustive]
pub struct TrackerConfig {
    /// The smallest timeout we will ever recommend.
    ///
    /// Must be nonzero.  Defaults to 100 milliseconds.
    #[builder(default = "default_min_timeout()")]
    #[builder_field_attr(serde(default, with = "humantime_serde::option"))]
    #[getset(get_copy = "pub")]
    min_timeout: Duration,

    /// The largest timeout we will ever recommend.
    ///
    /// Must be nonzero, and no smaller than `min_timeout`.  A freshly
    /// constructed tracker has its whole history filled with this value.
    /// Defaults to 1 second.
    #[builder(default = "default_max_timeout()")]
    #[builder_field_attr(serde(default, with = "humantime_serde::option"))]
    #[getset(get_copy = "pub")]
    max_timeout: Duration,

    /// How many recent observations to remember.
    ///
    /// Must be nonzero.  Defaults to 100.
    #[builder(default = "default_max_history()")]
    #[builder_field_attr(serde(default))]
    #[getset(get_copy = "pub")]
    max_history: usize,
}

/// Return the default value for `min_timeout`.
fn default_min_timeout() -> Duration {
    Duration::from_millis(100)
}

/// Return the default value for `max_timeout`.
fn default_max_timeout() -> Duration {
    Duration::from_secs(1)
}

/// Return the default value for `max_history`.
fn default_max_history() -> usize {
    100
}

impl TrackerConfig {
    /// Return a new [`TrackerConfigBuilder`].
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// Clamp `timeout` so that it lies between our minimum and maximum.
    pub(crate) fn clamp(&self, timeout: Duration) -> Duration {
        // Validation guarantees min <= max, so this can't panic.
        timeout.clamp(self.min_timeout, self.max_timeout)
    }
}

// The defaults are checked by `default_config_is_valid` below.
#[allow(clippy::unwrap_used)]
impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfigBuilder::default().build().unwrap()
    }
}

impl From<TrackerConfig> for TrackerConfigBuilder {
    fn from(cfg: TrackerConfig) -> TrackerConfigBuilder {
        let mut builder = TrackerConfigBuilder::default();
        builder
            .min_timeout(cfg.min_timeout)
            .max_timeout(cfg.max_timeout)
            .max_history(cfg.max_history);
        builder
    }
}

impl TrackerConfigBuilder {
    /// Check that the values in this builder are consistent.
    ///
    /// Fields that were never set are checked using their defaults.
    fn validate(&self) -> std::result::Result<(), Error> {
        let max_history = self.max_history.unwrap_or_else(default_max_history);
        let min = self.min_timeout.unwrap_or_else(default_min_timeout);
        let max = self.max_timeout.unwrap_or_else(default_max_timeout);

        if max_history == 0 {
            return Err(Error::InvalidCapacity);
        }
        if min.is_zero() {
            return Err(Error::InvalidMinTimeout);
        }
        if max.is_zero() {
            return Err(Error::InvalidMaxTimeout);
        }
        if min > max {
            return Err(Error::InvertedBounds { min, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    // @@ begin test lint list maintained by maint/add_warning @@
    #![allow(clippy::bool_assert_comparison)]
    #![allow(clippy::clone_on_copy)]
    #![allow(clippy::dbg_macro)]
    #![allow(clippy::mixed_attributes_style)]
    #![allow(clippy::print_stderr)]
    #![allow(clippy::print_stdout)]
    #![allow(clippy::single_char_pattern)]
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::unchecked_time_subtraction)]
    #![allow(clippy::useless_vec)]
    #![allow(clippy::needless_pass_by_value)]
    //! <!-- @@ end test lint list maintained by maint/add_warning @@ -->
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.min_timeout(), Duration::from_millis(100));
        assert_eq!(cfg.max_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.max_history(), 100);
    }

    #[test]
    fn builder_overrides() {
        let cfg = TrackerConfig::builder()
            .min_timeout(Duration::from_millis(10))
            .max_timeout(Duration::from_millis(20))
            .max_timeout(Duration::from_millis(30))
            .build()
            .unwrap();
        assert_eq!(cfg.min_timeout(), Duration::from_millis(10));
        // Later settings win.
        assert_eq!(cfg.max_timeout(), Duration::from_millis(30));
        assert_eq!(cfg.max_history(), 100);

        let rebuilt = TrackerConfigBuilder::from(cfg.clone()).build().unwrap();
        assert_eq!(rebuilt, cfg);
    }

    #[test]
    fn rejected() {
        let zero = Duration::ZERO;

        let e = TrackerConfig::builder().max_history(0).build();
        assert_eq!(e.unwrap_err(), Error::InvalidCapacity);

        let e = TrackerConfig::builder().min_timeout(zero).build();
        assert_eq!(e.unwrap_err(), Error::InvalidMinTimeout);

        let e = TrackerConfig::builder().max_timeout(zero).build();
        assert_eq!(e.unwrap_err(), Error::InvalidMaxTimeout);

        // The default minimum is 100 ms, so this is inverted.
        let e = TrackerConfig::builder()
            .max_timeout(Duration::from_millis(50))
            .build();
        assert_eq!(
            e.unwrap_err(),
            Error::InvertedBounds {
                min: Duration::from_millis(100),
                max: Duration::from_millis(50),
            }
        );

        // Equal bounds are fine.
        let cfg = TrackerConfig::builder()
            .min_timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(cfg.clamp(Duration::ZERO), Duration::from_secs(1));
    }

    #[test]
    fn clamp() {
        let cfg = TrackerConfig::builder()
            .min_timeout(Duration::from_nanos(10))
            .max_timeout(Duration::from_nanos(100))
            .build()
            .unwrap();
        assert_eq!(cfg.clamp(Duration::from_nanos(1)), Duration::from_nanos(10));
        assert_eq!(cfg.clamp(Duration::from_nanos(12)), Duration::from_nanos(12));
        assert_eq!(cfg.clamp(Duration::from_nanos(123)), Duration::from_nanos(100));
        assert_eq!(cfg.clamp(Duration::MAX), Duration::from_nanos(100));
    }

    #[test]
    fn from_toml() {
        let s = r#"
            min_timeout = "50 ms"
            max_timeout = "2s"
            max_history = 500
        "#;
        let b: TrackerConfigBuilder = toml::from_str(s).unwrap();
        let cfg = b.build().unwrap();
        assert_eq!(cfg.min_timeout(), Duration::from_millis(50));
        assert_eq!(cfg.max_timeout(), Duration::from_secs(2));
        assert_eq!(cfg.max_history(), 500);

        // Missing fields take their defaults.
        let b: TrackerConfigBuilder = toml::from_str(r#"max_history = 7"#).unwrap();
        let cfg = b.build().unwrap();
        assert_eq!(cfg.max_history(), 7);
        assert_eq!(cfg.max_timeout(), Duration::from_secs(1));

        let b: TrackerConfigBuilder = toml::from_str("").unwrap();
        assert_eq!(b.build().unwrap(), TrackerConfig::default());

        // Deserialization doesn't validate; building does.
        let b: TrackerConfigBuilder = toml::from_str(r#"max_timeout = "10 ms""#).unwrap();
        assert!(matches!(b.build(), Err(Error::InvertedBounds { .. })));
    }

    #[test]
    fn json_roundtrip() {
        let mut b = TrackerConfig::builder();
        b.max_timeout(Duration::from_millis(1500));
        let s = serde_json::to_string(&b).unwrap();
        let b2: TrackerConfigBuilder = serde_json::from_str(&s).unwrap();
        assert_eq!(b2.build().unwrap(), b.build().unwrap());
        assert_eq!(b2.build().unwrap().max_timeout(), Duration::from_millis(1500));
    }
}
