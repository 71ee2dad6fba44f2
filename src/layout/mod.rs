//! Natural and packed matrix layouts
//!
//! - `shape.rs`: `MatrixShape`, the validated dimensions of one matrix
//! - `coord.rs`: `PackedLayout` and the natural <-> packed index bijection
//! - `math.rs`: block arithmetic helpers

mod coord;
pub mod math;
mod shape;

pub use coord::{DEFAULT_PACK_FACTOR, PackedLayout, from_packed_coord, to_packed_coord};
pub use shape::MatrixShape;
