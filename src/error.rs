//! Error types for tilepack

use thiserror::Error;

/// Result type alias using tilepack's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packing or unpacking weights
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A matrix dimension is zero
    #[error("Invalid matrix shape {rows}x{cols}: dimensions must be non-zero")]
    InvalidShape {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },

    /// Buffer length does not match the shape it is packed with
    #[error("Length mismatch for {what}: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// The buffer being checked
        what: &'static str,
        /// Length implied by the shape parameters
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// Linear index outside `[0, rows * cols)`
    #[error("Index {index} out of bounds for matrix of {size} elements")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of elements in the matrix
        size: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a length mismatch error
    pub fn length_mismatch(what: &'static str, expected: usize, got: usize) -> Self {
        Self::LengthMismatch {
            what,
            expected,
            got,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
