//! Common test utilities
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::hash::Hash;

/// Route `log` output through the test harness (RUST_LOG=trace to see it)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic RNG so failures reproduce
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x7117_9ac4)
}

/// `count` random `(rows, cols)` pairs with both dimensions in `1..=max_dim`
pub fn random_shapes(rng: &mut StdRng, count: usize, max_dim: usize) -> Vec<(usize, usize)> {
    (0..count)
        .map(|_| (rng.random_range(1..=max_dim), rng.random_range(1..=max_dim)))
        .collect()
}

/// Count of each distinct value
pub fn histogram<T: Copy + Eq + Hash>(values: &[T]) -> HashMap<T, usize> {
    let mut counts = HashMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}

/// Assert `b` holds exactly the multiset of values in `a`
pub fn assert_permutation<T: Copy + Eq + Hash + std::fmt::Debug>(a: &[T], b: &[T], msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    assert_eq!(histogram(a), histogram(b), "{}: values differ", msg);
}
