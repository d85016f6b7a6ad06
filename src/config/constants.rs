//! # mmapbuf Configuration Constants
//!
//! Numeric defaults shared by the writer and its growth policy.
//!
//! ## Growth Increment
//!
//! ```text
//! DEFAULT_GROWTH_INCREMENT (8192 bytes)
//!       │
//!       ├─> initial capacity when no reserve is requested
//!       │     capacity = logical_size + DEFAULT_GROWTH_INCREMENT
//!       │
//!       └─> step size of every growth
//!             new_capacity = capacity + k * increment, k >= 1
//! ```
//!
//! The increment bounds the number of remaps for monotonically increasing
//! writes to `total_bytes / increment`. Larger values trade disk slack (which
//! is truncated away on close) for fewer remaps.
//!
//! ## Critical Invariants
//!
//! Enforced at compile time:
//!
//! 1. `DEFAULT_GROWTH_INCREMENT > 0` (a zero step could never reach a target)

/// Default step, in bytes, by which the backing file and mapping grow.
pub const DEFAULT_GROWTH_INCREMENT: usize = 8192;

const _: () = assert!(DEFAULT_GROWTH_INCREMENT > 0);
