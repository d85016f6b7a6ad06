//! # Growth Policy
//!
//! Capacity always grows by a whole number of increments above its previous
//! value:
//!
//! ```text
//! new = current + k * increment,   smallest k >= 1 with new >= required
//! ```
//!
//! For monotonically increasing writes this bounds the number of remaps to
//! `total_bytes / increment`.

use eyre::{ensure, eyre, Result};

/// Returns the smallest `current + k * increment` (k >= 1) that is at least
/// `required`.
///
/// Callers only invoke this when `required > current`. An `increment` of zero
/// or a capacity that would overflow `usize` is an error.
pub fn next_capacity(current: usize, required: usize, increment: usize) -> Result<usize> {
    ensure!(increment > 0, "growth increment must be greater than zero");

    let shortfall = required.saturating_sub(current);
    let steps = shortfall.div_ceil(increment).max(1);

    steps
        .checked_mul(increment)
        .and_then(|grow_by| current.checked_add(grow_by))
        .ok_or_else(|| {
            eyre!(
                "capacity overflow growing from {} to at least {} bytes",
                current,
                required
            )
        })
}
