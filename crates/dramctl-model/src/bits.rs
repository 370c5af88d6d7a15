//! Bit-width arithmetic shared by the geometry and port models.

/// Exact base-2 logarithm of `n`, or `None` if `n` is not a power of two.
pub fn log2_exact(n: u64) -> Option<u32> {
    if n.is_power_of_two() {
        Some(n.trailing_zeros())
    } else {
        None
    }
}

/// Number of bits needed to represent `n` as an unsigned value (at least 1).
pub fn bits_for(n: u64) -> u32 {
    (u64::BITS - n.leading_zeros()).max(1)
}
