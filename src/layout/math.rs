//! Integer helpers for block arithmetic

/// `val / divisor`, rounded up
#[inline]
pub const fn div_round_up(val: usize, divisor: usize) -> usize {
    val.div_ceil(divisor)
}

/// Smallest multiple of `divisor` that is `>= val`
#[inline]
pub const fn next_multiple(val: usize, divisor: usize) -> usize {
    div_round_up(val, divisor) * divisor
}

/// Largest multiple of `divisor` that is `<= val`
#[inline]
pub const fn previous_multiple(val: usize, divisor: usize) -> usize {
    (val / divisor) * divisor
}
