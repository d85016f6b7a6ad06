//! # mmapbuf Configuration Module
//!
//! Constants and the option builder used to open a [`MmapWriter`].
//!
//! ## Module Organization
//!
//! - [`constants`]: Numeric defaults with compile-time checks
//! - [`options`]: `WriterOptions` builder for open mode, reserve and growth step
//!
//! [`MmapWriter`]: crate::storage::MmapWriter

pub mod constants;
pub mod options;

pub use constants::*;
pub use options::WriterOptions;
