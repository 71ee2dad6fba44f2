//! Multi-layer weight packing
//!
//! A network's weights arrive as one flat buffer holding, in order:
//!
//! ```text
//! [ input  (network_width x input_width)                        ]
//! [ hidden (network_width x network_width)  x (num_hidden_layers - 1) ]
//! [ output (network_width x output_width)                       ]
//! ```
//!
//! `num_hidden_layers` counts the layers of activations between input and
//! output, so a network with `num_hidden_layers == 1` has no hidden matrix at
//! all. The buffer carries no boundaries of its own; the partition comes
//! entirely from [`NetworkShape`].

use super::matrix::{gather_natural, scatter_packed};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::layout::{MatrixShape, PackedLayout};
use std::iter;
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Below this many elements, layers are packed on the calling thread
#[cfg(feature = "rayon")]
const PARALLEL_MIN_ELEMS: usize = 1 << 16;

// ============================================================================
// NetworkShape
// ============================================================================

/// Dimensions of a fully-connected network's weight buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkShape {
    num_hidden_layers: usize,
    input_width: usize,
    network_width: usize,
    output_width: usize,
}

impl NetworkShape {
    /// Create a validated network shape
    ///
    /// All widths must be non-zero, `num_hidden_layers` must be at least 1,
    /// and the total element count must fit in `usize`.
    ///
    /// # Example
    /// ```
    /// use tilepack::pack::NetworkShape;
    /// let shape = NetworkShape::new(3, 4, 8, 2).unwrap();
    /// assert_eq!(shape.num_hidden_matrices(), 2);
    /// assert_eq!(shape.total_len(), 8 * 4 + 2 * 8 * 8 + 8 * 2);
    /// ```
    pub fn new(
        num_hidden_layers: usize,
        input_width: usize,
        network_width: usize,
        output_width: usize,
    ) -> Result<Self> {
        if num_hidden_layers == 0 {
            return Err(Error::invalid_argument(
                "num_hidden_layers",
                "must be at least 1",
            ));
        }
        for (arg, width) in [
            ("input_width", input_width),
            ("network_width", network_width),
            ("output_width", output_width),
        ] {
            if width == 0 {
                return Err(Error::invalid_argument(arg, "must be non-zero"));
            }
        }

        let total = network_width
            .checked_mul(network_width)
            .and_then(|hidden| hidden.checked_mul(num_hidden_layers - 1))
            .and_then(|hidden| {
                let input = network_width.checked_mul(input_width)?;
                let output = network_width.checked_mul(output_width)?;
                hidden.checked_add(input)?.checked_add(output)
            });
        if total.is_none() {
            return Err(Error::invalid_argument(
                "network_width",
                format!(
                    "weight buffer for {num_hidden_layers} hidden layers of width {network_width} overflows usize"
                ),
            ));
        }

        Ok(Self {
            num_hidden_layers,
            input_width,
            network_width,
            output_width,
        })
    }

    /// Number of hidden layers, as passed to [`new`](Self::new)
    #[inline]
    pub const fn num_hidden_layers(&self) -> usize {
        self.num_hidden_layers
    }

    /// Width of the network input
    #[inline]
    pub const fn input_width(&self) -> usize {
        self.input_width
    }

    /// Width of every hidden layer
    #[inline]
    pub const fn network_width(&self) -> usize {
        self.network_width
    }

    /// Width of the network output
    #[inline]
    pub const fn output_width(&self) -> usize {
        self.output_width
    }

    /// Number of hidden-to-hidden matrices (`num_hidden_layers - 1`)
    #[inline]
    pub const fn num_hidden_matrices(&self) -> usize {
        self.num_hidden_layers - 1
    }

    /// Number of matrices in the buffer: input, hidden, output
    #[inline]
    pub const fn num_matrices(&self) -> usize {
        self.num_hidden_matrices() + 2
    }

    /// Shape of the input matrix
    #[inline]
    pub const fn input_shape(&self) -> MatrixShape {
        MatrixShape::new_unchecked(self.network_width, self.input_width)
    }

    /// Shape shared by all hidden matrices
    #[inline]
    pub const fn hidden_shape(&self) -> MatrixShape {
        MatrixShape::new_unchecked(self.network_width, self.network_width)
    }

    /// Shape of the output matrix
    #[inline]
    pub const fn output_shape(&self) -> MatrixShape {
        MatrixShape::new_unchecked(self.network_width, self.output_width)
    }

    /// Elements in the input matrix
    #[inline]
    pub const fn input_len(&self) -> usize {
        self.input_shape().elem_count()
    }

    /// Elements in one hidden matrix
    #[inline]
    pub const fn hidden_len(&self) -> usize {
        self.hidden_shape().elem_count()
    }

    /// Elements in the output matrix
    #[inline]
    pub const fn output_len(&self) -> usize {
        self.output_shape().elem_count()
    }

    /// Required weight buffer length
    #[inline]
    pub const fn total_len(&self) -> usize {
        self.input_len() + self.num_hidden_matrices() * self.hidden_len() + self.output_len()
    }

    /// Shape of matrix `layer` (0 = input, last = output)
    pub fn layer_shape(&self, layer: usize) -> Option<MatrixShape> {
        match layer {
            0 => Some(self.input_shape()),
            l if l <= self.num_hidden_matrices() => Some(self.hidden_shape()),
            l if l == self.num_matrices() - 1 => Some(self.output_shape()),
            _ => None,
        }
    }

    /// Shapes of all matrices in buffer order
    pub fn layer_shapes(&self) -> impl Iterator<Item = MatrixShape> + use<> {
        iter::once(self.input_shape())
            .chain(iter::repeat_n(self.hidden_shape(), self.num_hidden_matrices()))
            .chain(iter::once(self.output_shape()))
    }

    /// Position of matrix `layer` in the flat buffer (0 = input, last = output)
    pub fn layer_range(&self, layer: usize) -> Option<Range<usize>> {
        let hidden = self.num_hidden_matrices();
        match layer {
            0 => Some(0..self.input_len()),
            l if l <= hidden => {
                let start = self.input_len() + (l - 1) * self.hidden_len();
                Some(start..start + self.hidden_len())
            }
            l if l == hidden + 1 => {
                let total = self.total_len();
                Some(total - self.output_len()..total)
            }
            _ => None,
        }
    }

    /// Position of every matrix in the flat buffer, in buffer order
    ///
    /// Input and hidden matrices are laid end to end from the start; the
    /// output matrix is the last `output_len()` elements.
    pub fn layer_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::with_capacity(self.num_matrices());
        ranges.push(0..self.input_len());
        let mut start = self.input_len();
        for _ in 0..self.num_hidden_matrices() {
            ranges.push(start..start + self.hidden_len());
            start += self.hidden_len();
        }
        let total = self.total_len();
        ranges.push(total - self.output_len()..total);
        ranges
    }
}

// ============================================================================
// PackedWeights
// ============================================================================

/// A packed weight buffer together with the shape and layout that produced it
///
/// Owns the data exclusively until handed to the device upload via
/// [`into_vec`](Self::into_vec) or [`as_bytes`](Self::as_bytes).
#[derive(Clone, Debug, PartialEq)]
pub struct PackedWeights<T> {
    data: Vec<T>,
    shape: NetworkShape,
    layout: PackedLayout,
}

impl<T: Element> PackedWeights<T> {
    /// Packed elements, all layers back to back
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Packed elements as raw bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a buffer built from a valid `NetworkShape`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Network dimensions
    #[inline]
    pub fn shape(&self) -> &NetworkShape {
        &self.shape
    }

    /// Layout every matrix was packed with
    #[inline]
    pub fn layout(&self) -> PackedLayout {
        self.layout
    }

    /// Packed elements of matrix `layer` (0 = input, last = output)
    pub fn layer(&self, layer: usize) -> Option<&[T]> {
        let range = self.shape.layer_range(layer)?;
        Some(&self.data[range])
    }

    /// Every packed matrix with its shape, in buffer order
    pub fn layers(&self) -> impl Iterator<Item = (MatrixShape, &[T])> + '_ {
        let data = &self.data;
        self.shape
            .layer_shapes()
            .zip(self.shape.layer_ranges())
            .map(move |(shape, range)| (shape, &data[range]))
    }

    /// Restore the natural (row-major) weight buffer
    pub fn unpack(&self) -> Vec<T> {
        transform_layers(&self.data, &self.shape, self.layout, Direction::Unpack)
    }

    /// Take the packed buffer
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> AsRef<[T]> for PackedWeights<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> From<PackedWeights<T>> for Vec<T> {
    fn from(weights: PackedWeights<T>) -> Self {
        weights.data
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Pack a flat natural-layout weight buffer into the default VNNI layout
///
/// Each matrix is packed independently with its own shape and the packed
/// matrices are concatenated in the original order.
///
/// # Errors
/// - `InvalidArgument` if a width is zero or `num_hidden_layers == 0`
/// - `LengthMismatch` if `buffer.len()` differs from
///   `network_width * input_width + (num_hidden_layers - 1) * network_width^2 + network_width * output_width`
///
/// # Example
/// ```
/// use tilepack::pack::pack_weights;
///
/// let weights: Vec<f32> = (0..176).map(|i| i as f32).collect();
/// let packed = pack_weights(&weights, 3, 4, 8, 2).unwrap();
/// assert_eq!(packed.len(), 176);
/// ```
pub fn pack_weights<T: Element>(
    buffer: &[T],
    num_hidden_layers: usize,
    input_width: usize,
    network_width: usize,
    output_width: usize,
) -> Result<Vec<T>> {
    let shape = NetworkShape::new(num_hidden_layers, input_width, network_width, output_width)?;
    pack_network(buffer, &shape, PackedLayout::default()).map(PackedWeights::into_vec)
}

/// Pack a flat natural-layout weight buffer with an explicit layout
pub fn pack_network<T: Element>(
    buffer: &[T],
    shape: &NetworkShape,
    layout: PackedLayout,
) -> Result<PackedWeights<T>> {
    check_buffer_len("weight buffer", buffer.len(), shape)?;
    let data = transform_layers(buffer, shape, layout, Direction::Pack);
    Ok(PackedWeights {
        data,
        shape: *shape,
        layout,
    })
}

/// Inverse of [`pack_weights`]: restore the natural-layout weight buffer
pub fn unpack_weights<T: Element>(
    packed: &[T],
    num_hidden_layers: usize,
    input_width: usize,
    network_width: usize,
    output_width: usize,
) -> Result<Vec<T>> {
    let shape = NetworkShape::new(num_hidden_layers, input_width, network_width, output_width)?;
    unpack_network(packed, &shape, PackedLayout::default())
}

/// Inverse of [`pack_network`]
pub fn unpack_network<T: Element>(
    packed: &[T],
    shape: &NetworkShape,
    layout: PackedLayout,
) -> Result<Vec<T>> {
    check_buffer_len("packed weight buffer", packed.len(), shape)?;
    Ok(transform_layers(packed, shape, layout, Direction::Unpack))
}

// ============================================================================
// Layer loop
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Direction {
    Pack,
    Unpack,
}

fn check_buffer_len(what: &'static str, len: usize, shape: &NetworkShape) -> Result<()> {
    if len != shape.total_len() {
        return Err(Error::length_mismatch(what, shape.total_len(), len));
    }
    Ok(())
}

/// Apply the per-matrix transform to every layer of `src`
///
/// `src.len()` must equal `shape.total_len()`.
fn transform_layers<T: Element>(
    src: &[T],
    shape: &NetworkShape,
    layout: PackedLayout,
    direction: Direction,
) -> Vec<T> {
    debug_assert_eq!(src.len(), shape.total_len());
    let mut out = vec![<T as bytemuck::Zeroable>::zeroed(); src.len()];

    // Ranges are contiguous and cover the buffer, so consecutive splits give
    // one disjoint destination per layer.
    let ranges = shape.layer_ranges();
    let mut jobs = Vec::with_capacity(ranges.len());
    let mut rest: &mut [T] = &mut out;
    for (layer_shape, range) in shape.layer_shapes().zip(ranges) {
        let (dst, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        rest = tail;
        jobs.push((layer_shape, &src[range], dst));
    }

    #[cfg(feature = "rayon")]
    let parallel = jobs.len() > 1 && src.len() >= PARALLEL_MIN_ELEMS;
    #[cfg(not(feature = "rayon"))]
    let parallel = false;

    log::debug!(
        "{:?} {} {} weights: {} -> {} hidden x {} -> {}, {} matrices, factor {}, parallel={}",
        direction,
        src.len(),
        T::DTYPE,
        shape.input_width(),
        shape.num_hidden_layers(),
        shape.network_width(),
        shape.output_width(),
        jobs.len(),
        layout.factor(),
        parallel
    );

    let run = |(layer, (layer_shape, src, dst)): (usize, (MatrixShape, &[T], &mut [T]))| {
        log::trace!(
            "{direction:?} layer {layer}: {layer_shape}, {} elements, {} rows padded",
            src.len(),
            layout.padded_rows(layer_shape.rows())
        );
        match direction {
            Direction::Pack => scatter_packed(src, dst, layer_shape, layout),
            Direction::Unpack => gather_natural(src, dst, layer_shape, layout),
        }
    };

    #[cfg(feature = "rayon")]
    {
        if parallel {
            jobs.into_par_iter().enumerate().for_each(run);
            return out;
        }
    }

    jobs.into_iter().enumerate().for_each(run);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::to_packed_coord;

    #[test]
    fn test_network_shape_partition() {
        let shape = NetworkShape::new(3, 4, 8, 2).unwrap();
        assert_eq!(shape.input_len(), 32);
        assert_eq!(shape.hidden_len(), 64);
        assert_eq!(shape.output_len(), 16);
        assert_eq!(shape.total_len(), 176);
        assert_eq!(shape.num_matrices(), 4);
        assert_eq!(shape.layer_ranges(), vec![0..32, 32..96, 96..160, 160..176]);
    }

    #[test]
    fn test_network_shape_single_hidden_layer() {
        let shape = NetworkShape::new(1, 16, 64, 3).unwrap();
        assert_eq!(shape.num_hidden_matrices(), 0);
        assert_eq!(shape.total_len(), 64 * 16 + 64 * 3);
        let shapes: Vec<_> = shape.layer_shapes().collect();
        assert_eq!(shapes, [shape.input_shape(), shape.output_shape()]);
        assert_eq!(shape.layer_ranges(), vec![0..1024, 1024..1216]);
    }

    #[test]
    fn test_network_shape_layer_shape() {
        let shape = NetworkShape::new(3, 4, 8, 2).unwrap();
        assert_eq!(shape.layer_shape(0), Some(MatrixShape::new(8, 4).unwrap()));
        assert_eq!(shape.layer_shape(1), Some(MatrixShape::new(8, 8).unwrap()));
        assert_eq!(shape.layer_shape(2), Some(MatrixShape::new(8, 8).unwrap()));
        assert_eq!(shape.layer_shape(3), Some(MatrixShape::new(8, 2).unwrap()));
        assert_eq!(shape.layer_shape(4), None);
    }

    #[test]
    fn test_layer_range_matches_layer_ranges() {
        for hidden in 1..=4 {
            let shape = NetworkShape::new(hidden, 3, 5, 2).unwrap();
            let ranges = shape.layer_ranges();
            for (layer, range) in ranges.iter().enumerate() {
                assert_eq!(shape.layer_range(layer).as_ref(), Some(range));
            }
            assert_eq!(shape.layer_range(ranges.len()), None);
        }
    }

    #[test]
    fn test_network_shape_validation() {
        assert!(matches!(
            NetworkShape::new(0, 4, 8, 2),
            Err(Error::InvalidArgument {
                arg: "num_hidden_layers",
                ..
            })
        ));
        assert!(matches!(
            NetworkShape::new(2, 0, 8, 2),
            Err(Error::InvalidArgument {
                arg: "input_width",
                ..
            })
        ));
        assert!(matches!(
            NetworkShape::new(2, 4, 0, 2),
            Err(Error::InvalidArgument {
                arg: "network_width",
                ..
            })
        ));
        assert!(matches!(
            NetworkShape::new(2, 4, 8, 0),
            Err(Error::InvalidArgument {
                arg: "output_width",
                ..
            })
        ));
        assert!(NetworkShape::new(3, 1, usize::MAX / 2, 1).is_err());
    }

    #[test]
    fn test_pack_weights_per_layer() {
        let shape = NetworkShape::new(2, 2, 4, 3).unwrap();
        let weights: Vec<u32> = (0..shape.total_len() as u32).collect();
        let packed = pack_weights(&weights, 2, 2, 4, 3).unwrap();

        for (layer_shape, range) in shape.layer_shapes().zip(shape.layer_ranges()) {
            let (rows, cols) = (layer_shape.rows(), layer_shape.cols());
            for idx in 0..rows * cols {
                let dst = range.start + to_packed_coord(idx, rows, cols);
                assert_eq!(packed[dst], weights[range.start + idx]);
            }
        }
    }

    #[test]
    fn test_pack_weights_length_mismatch() {
        let weights = vec![0.0f32; 175];
        assert_eq!(
            pack_weights(&weights, 3, 4, 8, 2),
            Err(Error::length_mismatch("weight buffer", 176, 175))
        );
    }

    #[test]
    fn test_packed_weights_accessors() {
        let shape = NetworkShape::new(2, 4, 6, 2).unwrap();
        let weights: Vec<i32> = (0..shape.total_len() as i32).collect();
        let packed = pack_network(&weights, &shape, PackedLayout::default()).unwrap();

        assert_eq!(packed.len(), weights.len());
        assert!(!packed.is_empty());
        assert_eq!(packed.shape(), &shape);
        assert_eq!(packed.layout(), PackedLayout::default());
        assert_eq!(packed.as_bytes().len(), weights.len() * 4);
        assert_eq!(packed.layer(0).map(<[i32]>::len), Some(24));
        assert_eq!(packed.layer(1).map(<[i32]>::len), Some(36));
        assert_eq!(packed.layer(2).map(<[i32]>::len), Some(12));
        assert!(packed.layer(3).is_none());
        assert_eq!(packed.layers().count(), 3);
        assert_eq!(packed.unpack(), weights);
    }

    #[test]
    fn test_unpack_network_rejects_wrong_length() {
        let shape = NetworkShape::new(1, 2, 2, 2).unwrap();
        assert_eq!(
            unpack_network(&[0u8; 9], &shape, PackedLayout::default()),
            Err(Error::length_mismatch("packed weight buffer", 8, 9))
        );
    }
}
