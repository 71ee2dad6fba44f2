//! Single-matrix packing
//!
//! Values are moved, never interpreted, so these functions work for any
//! `Copy` element type.

use crate::error::Result;
use crate::layout::{MatrixShape, PackedLayout};

/// Pack one row-major matrix into the default VNNI layout
///
/// The element at natural index `idx` ends up at
/// `to_packed_coord(idx, rows, cols)` of the returned buffer.
///
/// # Example
/// ```
/// use tilepack::layout::MatrixShape;
/// use tilepack::pack::pack_matrix;
///
/// let shape = MatrixShape::new(2, 3).unwrap();
/// let packed = pack_matrix(&[1, 2, 3, 4, 5, 6], shape).unwrap();
/// assert_eq!(packed, [1, 4, 2, 5, 3, 6]);
/// ```
pub fn pack_matrix<T: Copy>(src: &[T], shape: MatrixShape) -> Result<Vec<T>> {
    pack_matrix_with(src, shape, PackedLayout::default())
}

/// Pack one row-major matrix into `layout`
pub fn pack_matrix_with<T: Copy>(
    src: &[T],
    shape: MatrixShape,
    layout: PackedLayout,
) -> Result<Vec<T>> {
    shape.check_len("matrix", src.len())?;
    // Every slot is overwritten below; cloning src only provides initialized storage
    let mut packed = src.to_vec();
    scatter_packed(src, &mut packed, shape, layout);
    Ok(packed)
}

/// Pack one row-major matrix into a caller-provided buffer
///
/// `dst` must hold exactly `rows * cols` elements. Nothing is written if
/// either length is wrong.
pub fn pack_matrix_into<T: Copy>(
    src: &[T],
    dst: &mut [T],
    shape: MatrixShape,
    layout: PackedLayout,
) -> Result<()> {
    shape.check_len("matrix", src.len())?;
    shape.check_len("packed matrix", dst.len())?;
    scatter_packed(src, dst, shape, layout);
    Ok(())
}

/// Restore a packed matrix (default layout) to row-major order
pub fn unpack_matrix<T: Copy>(packed: &[T], shape: MatrixShape) -> Result<Vec<T>> {
    unpack_matrix_with(packed, shape, PackedLayout::default())
}

/// Restore a matrix packed with `layout` to row-major order
pub fn unpack_matrix_with<T: Copy>(
    packed: &[T],
    shape: MatrixShape,
    layout: PackedLayout,
) -> Result<Vec<T>> {
    shape.check_len("packed matrix", packed.len())?;
    let mut natural = packed.to_vec();
    gather_natural(packed, &mut natural, shape, layout);
    Ok(natural)
}

/// Restore a packed matrix into a caller-provided row-major buffer
pub fn unpack_matrix_into<T: Copy>(
    packed: &[T],
    dst: &mut [T],
    shape: MatrixShape,
    layout: PackedLayout,
) -> Result<()> {
    shape.check_len("packed matrix", packed.len())?;
    shape.check_len("matrix", dst.len())?;
    gather_natural(packed, dst, shape, layout);
    Ok(())
}

/// `dst[to_packed(idx)] = src[idx]` for every natural index
///
/// Callers guarantee `src.len() == dst.len() == shape.elem_count()`.
#[inline]
pub(crate) fn scatter_packed<T: Copy>(
    src: &[T],
    dst: &mut [T],
    shape: MatrixShape,
    layout: PackedLayout,
) {
    debug_assert_eq!(src.len(), shape.elem_count());
    debug_assert_eq!(dst.len(), shape.elem_count());
    let (rows, cols) = (shape.rows(), shape.cols());
    for (idx, &value) in src.iter().enumerate() {
        dst[layout.to_packed(idx, rows, cols)] = value;
    }
}

/// `dst[from_packed(p)] = packed[p]` for every packed index
#[inline]
pub(crate) fn gather_natural<T: Copy>(
    packed: &[T],
    dst: &mut [T],
    shape: MatrixShape,
    layout: PackedLayout,
) {
    debug_assert_eq!(packed.len(), shape.elem_count());
    debug_assert_eq!(dst.len(), shape.elem_count());
    let (rows, cols) = (shape.rows(), shape.cols());
    for (p, &value) in packed.iter().enumerate() {
        dst[layout.from_packed(p, rows, cols)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn shape(rows: usize, cols: usize) -> MatrixShape {
        MatrixShape::new(rows, cols).unwrap()
    }

    #[test]
    fn test_pack_4x3() {
        let src: Vec<u32> = (0..12).collect();
        let packed = pack_matrix(&src, shape(4, 3)).unwrap();
        assert_eq!(packed, [0, 3, 1, 4, 2, 5, 6, 9, 7, 10, 8, 11]);
    }

    #[test]
    fn test_pack_odd_rows() {
        let src = ['a', 'b', 'c', 'd', 'e', 'f'];
        let packed = pack_matrix(&src, shape(3, 2)).unwrap();
        assert_eq!(packed, ['a', 'c', 'b', 'd', 'e', 'f']);
    }

    #[test]
    fn test_pack_leaves_input_untouched() {
        let src = vec![1.0f32, 2.0, 3.0, 4.0];
        let before = src.clone();
        let _ = pack_matrix(&src, shape(2, 2)).unwrap();
        assert_eq!(src, before);
    }

    #[test]
    fn test_pack_length_mismatch() {
        let err = pack_matrix(&[1, 2, 3], shape(2, 2)).unwrap_err();
        assert_eq!(err, Error::length_mismatch("matrix", 4, 3));
    }

    #[test]
    fn test_pack_into_checks_dst_before_writing() {
        let mut dst = [0u8; 5];
        let src = [1u8, 2, 3, 4, 5, 6];
        let err =
            pack_matrix_into(&src, &mut dst, shape(3, 2), PackedLayout::default()).unwrap_err();
        assert_eq!(err, Error::length_mismatch("packed matrix", 6, 5));
        assert_eq!(dst, [0; 5]);
    }

    #[test]
    fn test_unpack_restores_natural_order() {
        let src: Vec<i16> = (0..35).collect();
        for factor in 1..=4 {
            let layout = PackedLayout::new(factor).unwrap();
            let packed = pack_matrix_with(&src, shape(7, 5), layout).unwrap();
            let restored = unpack_matrix_with(&packed, shape(7, 5), layout).unwrap();
            assert_eq!(restored, src, "factor {factor}");
        }
    }

    #[test]
    fn test_unpack_into() {
        let packed = [0u32, 3, 1, 4, 2, 5, 6, 9, 7, 10, 8, 11];
        let mut natural = [0u32; 12];
        unpack_matrix_into(&packed, &mut natural, shape(4, 3), PackedLayout::default()).unwrap();
        let expected: Vec<u32> = (0..12).collect();
        assert_eq!(natural.to_vec(), expected);
    }
}
