//! Coordinate mapping between natural and packed matrix layout
//!
//! The packed layout is the VNNI "vertical pack" that subgroup matrix-multiply
//! units expect for their B operand: one 32-bit lane holds `factor`
//! consecutive K-rows of the same column.
//!
//! ```text
//! natural (5x3)        packed, factor 2
//! a0 a1 a2             a0 b0 a1 b1 a2 b2     rows 0-1
//! b0 b1 b2             c0 d0 c1 d1 c2 d2     rows 2-3
//! c0 c1 c2             e0 e1 e2              row 4 (short block)
//! d0 d1 d2
//! e0 e1 e2
//! ```
//!
//! Rows are grouped into blocks of `factor` rows. Block `b` starts at row
//! `b * factor` and at packed offset `b * factor * cols`; its height is
//! `h = min(factor, rows - b * factor)`. Element `(row, col)` of the block
//! lands at `block_start + col * h + (row - block_row)`. Every block is a
//! `h x cols` transpose, so the mapping is a bijection for any `rows, cols`.

use super::math::{next_multiple, previous_multiple};
use super::shape::MatrixShape;
use crate::dtype::DType;
use crate::error::{Error, Result};

/// Pack factor of the default layout (bf16/f16 VNNI)
pub const DEFAULT_PACK_FACTOR: usize = 2;

/// Width of one VNNI lane in bytes
const VNNI_LANE_BYTES: usize = 4;

/// A fixed VNNI row-interleave scheme
///
/// The layout depends only on the matrix shape and the pack factor, never on
/// matrix contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackedLayout {
    factor: usize,
}

impl PackedLayout {
    /// Layout used by the free functions and `pack_weights`
    pub const VNNI_16BIT: Self = Self {
        factor: DEFAULT_PACK_FACTOR,
    };

    /// Layout that leaves the matrix in natural order
    pub const IDENTITY: Self = Self { factor: 1 };

    /// Create a layout that interleaves `factor` consecutive rows
    pub fn new(factor: usize) -> Result<Self> {
        if factor == 0 {
            return Err(Error::invalid_argument("factor", "must be at least 1"));
        }
        Ok(Self { factor })
    }

    /// VNNI layout for elements of `dtype`: as many rows as fit in a 32-bit lane
    ///
    /// f32 and wider get the identity layout, f16/bf16 pack 2 rows, 8-bit types pack 4.
    pub const fn for_dtype(dtype: DType) -> Self {
        let size = dtype.size_in_bytes();
        let factor = if size >= VNNI_LANE_BYTES {
            1
        } else {
            VNNI_LANE_BYTES / size
        };
        Self { factor }
    }

    /// Number of rows interleaved per block
    #[inline]
    pub const fn factor(&self) -> usize {
        self.factor
    }

    /// Row count a kernel sees if it zero-pads the trailing block to full height
    #[inline]
    pub const fn padded_rows(&self, rows: usize) -> usize {
        next_multiple(rows, self.factor)
    }

    /// Map a natural (row-major) index to its packed index
    ///
    /// # Panics
    /// If `rows` or `cols` is zero, or `idx >= rows * cols`.
    #[inline]
    pub fn to_packed(&self, idx: usize, rows: usize, cols: usize) -> usize {
        check_coord(idx, rows, cols);
        let row = idx / cols;
        let col = idx % cols;
        let block_row = previous_multiple(row, self.factor);
        let height = self.factor.min(rows - block_row);
        block_row * cols + col * height + (row - block_row)
    }

    /// Map a packed index back to its natural (row-major) index
    ///
    /// Exact inverse of [`to_packed`](Self::to_packed) for the same shape.
    ///
    /// # Panics
    /// If `rows` or `cols` is zero, or `idx >= rows * cols`.
    #[inline]
    pub fn from_packed(&self, idx: usize, rows: usize, cols: usize) -> usize {
        check_coord(idx, rows, cols);
        // All blocks before the last are full, so block `b` starts at b * factor * cols
        let block_row = previous_multiple(idx / cols, self.factor);
        let offset = idx - block_row * cols;
        let height = self.factor.min(rows - block_row);
        let col = offset / height;
        let row = block_row + offset % height;
        row * cols + col
    }

    /// Bounds-checked [`to_packed`](Self::to_packed)
    pub fn try_to_packed(&self, idx: usize, shape: MatrixShape) -> Result<usize> {
        check_index(idx, shape)?;
        Ok(self.to_packed(idx, shape.rows(), shape.cols()))
    }

    /// Bounds-checked [`from_packed`](Self::from_packed)
    pub fn try_from_packed(&self, idx: usize, shape: MatrixShape) -> Result<usize> {
        check_index(idx, shape)?;
        Ok(self.from_packed(idx, shape.rows(), shape.cols()))
    }
}

impl Default for PackedLayout {
    fn default() -> Self {
        Self::VNNI_16BIT
    }
}

/// Contract of the unchecked mapper, enforced in every build profile
#[inline]
#[track_caller]
fn check_coord(idx: usize, rows: usize, cols: usize) {
    assert!(rows > 0 && cols > 0, "empty {rows}x{cols} matrix");
    assert!(idx < rows * cols, "index {idx} outside {rows}x{cols} matrix");
}

#[inline]
fn check_index(idx: usize, shape: MatrixShape) -> Result<()> {
    if idx >= shape.elem_count() {
        return Err(Error::IndexOutOfBounds {
            index: idx,
            size: shape.elem_count(),
        });
    }
    Ok(())
}

/// Map a natural index to the packed index of the default layout
///
/// # Example
/// ```
/// use tilepack::layout::{from_packed_coord, to_packed_coord};
/// // 4x3 matrix: element (1, 0) sits right after (0, 0)
/// assert_eq!(to_packed_coord(3, 4, 3), 1);
/// assert_eq!(from_packed_coord(1, 4, 3), 3);
/// ```
#[inline]
pub fn to_packed_coord(idx: usize, rows: usize, cols: usize) -> usize {
    PackedLayout::VNNI_16BIT.to_packed(idx, rows, cols)
}

/// Map a packed index of the default layout back to its natural index
#[inline]
pub fn from_packed_coord(idx: usize, rows: usize, cols: usize) -> usize {
    PackedLayout::VNNI_16BIT.from_packed(idx, rows, cols)
}
