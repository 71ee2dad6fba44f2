//! Weight packing
//!
//! - `matrix.rs`: pack/unpack one matrix through a [`PackedLayout`](crate::layout::PackedLayout)
//! - `network.rs`: slice a flat multi-layer weight buffer and pack every matrix

mod matrix;
mod network;

pub use matrix::{
    pack_matrix, pack_matrix_into, pack_matrix_with, unpack_matrix, unpack_matrix_into,
    unpack_matrix_with,
};
pub use network::{
    NetworkShape, PackedWeights, pack_network, pack_weights, unpack_network, unpack_weights,
};
