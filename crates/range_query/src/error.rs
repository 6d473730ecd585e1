//! Error types shared by every range-query backend.

use thiserror::Error;

/// Failures surfaced synchronously by backend operations.
///
/// Every check runs before the structure is touched, so a call that returns
/// an error leaves the backend exactly as it was.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// `left > right`, or `right` falls outside `[0, len)`.
    #[error("invalid range [{left}, {right}] for length {len}")]
    InvalidRange {
        left: usize,
        right: usize,
        len: usize,
    },

    /// A single-position access beyond the sequence.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The backend or its combiner cannot perform the requested operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// A combiner broke the identity or associativity law on sampled values.
    #[error("algebra contract violation: {0}")]
    AlgebraContractViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
