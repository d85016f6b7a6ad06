//! # Writer Options
//!
//! `WriterOptions` configures how a [`MmapWriter`] is opened: whether the file
//! is reset or appended to, how much capacity to reserve up front, and the
//! step by which the mapping grows afterwards.
//!
//! ## Configuration Options
//!
//! | Option           | Default                    | Description                          |
//! |------------------|----------------------------|--------------------------------------|
//! | mode             | `OpenMode::Truncate`       | Reset the file or keep its contents  |
//! | initial_reserve  | 0 (one growth increment)   | Slack mapped beyond existing data    |
//! | growth_increment | `DEFAULT_GROWTH_INCREMENT` | Step size for every later growth     |
//!
//! ## Usage
//!
//! ```ignore
//! let writer = MmapWriter::options()
//!     .mode(OpenMode::Append)
//!     .initial_reserve(1 << 20)
//!     .growth_increment(64 * 1024)
//!     .open("./data.bin")?;
//! ```
//!
//! [`MmapWriter`]: crate::storage::MmapWriter

use std::path::Path;

use eyre::{ensure, eyre, Result};

use super::constants::DEFAULT_GROWTH_INCREMENT;
use crate::storage::{MmapWriter, OpenMode};

/// Builder for opening a [`MmapWriter`].
///
/// Use `MmapWriter::options()` or `WriterOptions::new()`, chain settings, then
/// call `open()` (or `open_fd()` on unix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    mode: OpenMode,
    initial_reserve: usize,
    growth_increment: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterOptions {
    pub fn new() -> Self {
        Self {
            mode: OpenMode::Truncate,
            initial_reserve: 0,
            growth_increment: DEFAULT_GROWTH_INCREMENT,
        }
    }

    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `mode(OpenMode::Truncate)` / `mode(OpenMode::Append)`.
    pub fn truncate(self, truncate: bool) -> Self {
        self.mode(if truncate {
            OpenMode::Truncate
        } else {
            OpenMode::Append
        })
    }

    /// Bytes of capacity mapped beyond the existing data at open.
    ///
    /// Zero means "one growth increment".
    pub fn initial_reserve(mut self, bytes: usize) -> Self {
        self.initial_reserve = bytes;
        self
    }

    /// Step size for growth. Must be non-zero; checked by `open()`.
    pub fn growth_increment(mut self, bytes: usize) -> Self {
        self.growth_increment = bytes;
        self
    }

    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<MmapWriter> {
        MmapWriter::open_with(path, self)
    }

    /// Opens a writer over a caller-owned descriptor.
    ///
    /// The descriptor is duplicated; the caller's descriptor is never closed
    /// by the writer.
    #[cfg(unix)]
    pub fn open_fd<F: std::os::fd::AsFd>(self, fd: F) -> Result<MmapWriter> {
        MmapWriter::open_fd_with(fd, self)
    }

    pub fn get_mode(&self) -> OpenMode {
        self.mode
    }

    pub fn get_initial_reserve(&self) -> usize {
        self.initial_reserve
    }

    pub fn get_growth_increment(&self) -> usize {
        self.growth_increment
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            self.growth_increment > 0,
            "growth increment must be greater than zero"
        );
        Ok(())
    }

    /// Capacity to map when the file already holds `existing` bytes of data.
    pub(crate) fn initial_capacity(&self, existing: usize) -> Result<usize> {
        let slack = if self.initial_reserve > 0 {
            self.initial_reserve
        } else {
            self.growth_increment
        };

        existing.checked_add(slack).ok_or_else(|| {
            eyre!(
                "initial capacity overflows: {} existing bytes + {} reserved",
                existing,
                slack
            )
        })
    }
}
