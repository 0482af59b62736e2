//! Error handling.

use std::time::Duration;

use thiserror::Error;

/// Result alias using this crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error originating from the latency-timeout crate.
///
/// All of these are construction-time errors: once a
/// [`LatencyTracker`](crate::LatencyTracker) exists, nothing it does can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The history capacity was zero.
    #[error("max_history must be positive")]
    InvalidCapacity,

    /// The minimum timeout was zero.
    #[error("min_timeout must be positive")]
    InvalidMinTimeout,

    /// The maximum timeout was zero.
    #[error("max_timeout must be positive")]
    InvalidMaxTimeout,

    /// The minimum timeout was greater than the maximum timeout.
    #[error("min_timeout ({min:?}) is greater than max_timeout ({max:?})")]
    InvertedBounds {
        /// The configured minimum.
        min: Duration,
        /// The configured maximum.
        max: Duration,
    },

    /// No [`TimeoutPolicy`](crate::TimeoutPolicy) was provided.
    #[error("No timeout policy was provided")]
    MissingPolicy,

    /// A mandatory configuration field was not present.
    #[error("Field was not provided: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(val: derive_builder::UninitializedFieldError) -> Self {
        Error::MissingField {
            field: val.field_name().to_string(),
        }
    }
}
