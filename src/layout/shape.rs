//! MatrixShape: dimensions of one weight matrix

use crate::error::{Error, Result};
use std::fmt;

/// Dimensions of one logical weight matrix stored contiguously
///
/// Both dimensions are non-zero and `rows * cols` fits in `usize`, so every
/// `MatrixShape` describes a valid index space `[0, rows * cols)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    rows: usize,
    cols: usize,
}

impl MatrixShape {
    /// Create a validated shape
    ///
    /// # Example
    /// ```
    /// use tilepack::layout::MatrixShape;
    /// let shape = MatrixShape::new(8, 4).unwrap();
    /// assert_eq!(shape.elem_count(), 32);
    /// assert!(MatrixShape::new(0, 4).is_err());
    /// ```
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape { rows, cols });
        }
        if rows.checked_mul(cols).is_none() {
            return Err(Error::invalid_argument(
                "shape",
                format!("{rows}x{cols} matrix overflows usize"),
            ));
        }
        Ok(Self { rows, cols })
    }

    /// Create a shape whose dimensions were already validated by the caller
    #[inline]
    pub(crate) const fn new_unchecked(rows: usize, cols: usize) -> Self {
        debug_assert!(rows > 0 && cols > 0);
        Self { rows, cols }
    }

    /// Number of rows
    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements (`rows * cols`)
    #[inline]
    pub const fn elem_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Fail with `LengthMismatch` unless `len == rows * cols`
    pub fn check_len(&self, what: &'static str, len: usize) -> Result<()> {
        if len != self.elem_count() {
            return Err(Error::length_mismatch(what, self.elem_count(), len));
        }
        Ok(())
    }
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
