//! # tilepack
//!
//! **Weight packing for subgroup matrix-multiply kernels.**
//!
//! Matrix-multiply units that work on 32-bit lanes (Intel XMX, AMX, VNNI dot
//! products) read their B operand with several consecutive K-rows folded into
//! one lane. tilepack converts dense row-major weight matrices into that
//! layout, and reassembles a multi-layer network's flat weight buffer into the
//! packed form layer by layer.
//!
//! Everything here is a pure, deterministic layout transformation: no
//! arithmetic on the weights, no device memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use tilepack::prelude::*;
//!
//! // 3 hidden layers: input matrix, 2 hidden matrices, output matrix
//! let weights: Vec<f32> = (0..176).map(|i| i as f32).collect();
//! let packed = pack_weights(&weights, 3, 4, 8, 2)?;
//! assert_eq!(packed.len(), weights.len());
//!
//! let restored = unpack_weights(&packed, 3, 4, 8, 2)?;
//! assert_eq!(restored, weights);
//! # Ok::<(), tilepack::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): pack the layers of large networks in parallel
//! - `f16`: Half-precision elements (`half::f16`, `half::bf16`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod layout;
pub mod pack;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::layout::{MatrixShape, PackedLayout, from_packed_coord, to_packed_coord};
    pub use crate::pack::{
        NetworkShape, PackedWeights, pack_matrix, pack_network, pack_weights, unpack_matrix,
        unpack_network, unpack_weights,
    };
}
