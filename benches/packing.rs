#![allow(dead_code)]

use fluxbench::{Bencher, flux};
use std::hint::black_box;

use tilepack::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn weights_f32(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 17 + 3) % 1000) as f32 / 1000.0)
        .collect()
}

// ---------------------------------------------------------------------------
// Single matrix (parameterized)
// ---------------------------------------------------------------------------

#[flux::bench(group = "pack_matrix_f32", args = [64, 128, 256, 512])]
fn pack_square(b: &mut Bencher, size: usize) {
    let shape = MatrixShape::new(size, size).unwrap();
    let src = weights_f32(size * size);
    b.iter(|| black_box(pack_matrix(&src, shape).unwrap()));
}

// ---------------------------------------------------------------------------
// Whole network
// ---------------------------------------------------------------------------

#[flux::bench(group = "pack_weights_f32", args = [64, 128, 256])]
fn pack_mlp(b: &mut Bencher, width: usize) {
    let shape = NetworkShape::new(8, 32, width, 16).unwrap();
    let weights = weights_f32(shape.total_len());
    b.iter(|| black_box(pack_weights(&weights, 8, 32, width, 16).unwrap()));
}

#[flux::bench(group = "unpack_weights_f32", args = [64, 256])]
fn unpack_mlp(b: &mut Bencher, width: usize) {
    let shape = NetworkShape::new(8, 32, width, 16).unwrap();
    let packed = pack_weights(&weights_f32(shape.total_len()), 8, 32, width, 16).unwrap();
    b.iter(|| black_box(unpack_weights(&packed, 8, 32, width, 16).unwrap()));
}

fn main() {
    if let Err(e) = fluxbench::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
