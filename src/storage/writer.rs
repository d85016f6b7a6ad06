//! # Growable Memory-Mapped Writer
//!
//! `MmapWriter` writes into a shared file mapping instead of issuing
//! `write(2)` calls. The file and the mapping grow transparently as data is
//! appended or written at arbitrary offsets, and shrink back to exactly the
//! data written when asked (or on close).
//!
//! ## Three Numbers
//!
//! The writer keeps three sizes consistent across every call:
//!
//! ```text
//! 0 <= cursor <= capacity
//! 0 <= size   <= capacity
//!
//! |<------------- size ------------->|<--- slack --->|
//! |<------ cursor ------>|                           |
//! |<--------------------- capacity ----------------->|
//! ```
//!
//! - **capacity**: bytes mapped, equal to the backing file's length
//! - **size**: high-water mark of every position written or seeked to
//! - **cursor**: position of the next sequential `write()`
//!
//! ## Growth
//!
//! A call that needs capacity beyond the mapping first asks the growth
//! policy for a new capacity (a whole number of increments above the current
//! one), then resizes the file, then remaps. Only after both succeed are bytes
//! copied. If the resize fails nothing has changed. If the remap fails the
//! file has already grown while the mapping has not; the writer is marked
//! failed and refuses further mutation until reopened.
//!
//! ## Close
//!
//! Dropping the writer unmaps, truncates the file down to `size()` so that
//! growth slack never persists, then closes the descriptor. `close()` does the
//! same but reports a failed truncate instead of logging it. Unmapping cannot
//! report failure, so only truncate errors ever reach the log.
//!
//! If `shrink_to_fit()` unmaps the slack but the truncate then fails, the
//! slack is mapped again and capacity is unchanged. Only when that remap also
//! fails is the writer marked failed.
//!
//! ## Seeking Past the Data
//!
//! Seeking forward raises `size()` even without a write. The span between the
//! old size and the new cursor reads back as zeros, because extending the
//! file zero-fills.

use std::path::Path;

use eyre::{ensure, eyre, Result, WrapErr};
use tracing::{debug, trace, warn};

use super::backing::BackingStore;
use super::growth::next_capacity;
use super::region::MappedRegion;
use super::{resolve_offset, Anchor, OpenMode, SyncMode};
use crate::config::WriterOptions;

#[derive(Debug)]
pub struct MmapWriter {
    store: BackingStore,
    region: MappedRegion,
    len: usize,
    pos: usize,
    growth_increment: usize,
    failed: bool,
    closed: bool,
}

impl MmapWriter {
    /// Opens `path` with the default reserve and growth increment.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        WriterOptions::new().mode(mode).open(path)
    }

    /// Opens a writer over a caller-owned descriptor with default settings.
    ///
    /// Only a duplicate of the descriptor is closed on shutdown.
    #[cfg(unix)]
    pub fn open_fd<F: std::os::fd::AsFd>(fd: F, mode: OpenMode) -> Result<Self> {
        WriterOptions::new().mode(mode).open_fd(fd)
    }

    pub fn options() -> WriterOptions {
        WriterOptions::new()
    }

    pub(crate) fn open_with<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        let store = BackingStore::open(path, options.get_mode())?;
        Self::from_store(store, options)
    }

    #[cfg(unix)]
    pub(crate) fn open_fd_with<F: std::os::fd::AsFd>(fd: F, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        let store = BackingStore::from_fd(fd, options.get_mode())?;
        Self::from_store(store, options)
    }

    fn from_store(mut store: BackingStore, options: WriterOptions) -> Result<Self> {
        let len = store.len();
        let capacity = options.initial_capacity(len)?;

        store.resize(capacity)?;

        let region = match MappedRegion::map(store.file(), capacity) {
            Ok(region) => region,
            Err(err) => {
                // The descriptor closes when `store` drops; put the length back
                // so the reserve is not left behind.
                if let Err(restore) = store.resize(len) {
                    warn!(
                        file = %store.name(),
                        error = %restore,
                        "failed to restore file length after mapping failure"
                    );
                }
                return Err(err.wrap_err(format!("failed to map '{}'", store.name())));
            }
        };

        trace!(
            file = %store.name(),
            size = len,
            capacity,
            "opened mmap writer"
        );

        Ok(Self {
            store,
            region,
            len,
            pos: len,
            growth_increment: options.get_growth_increment(),
            failed: false,
            closed: false,
        })
    }

    /// Current cursor position.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Logical size: the furthest position ever written or seeked to.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Bytes currently mapped (and held by the backing file).
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    pub fn growth_increment(&self) -> usize {
        self.growth_increment
    }

    /// Changes the step used by future growth. Zero is rejected.
    pub fn set_growth_increment(&mut self, bytes: usize) -> Result<()> {
        ensure!(bytes > 0, "growth increment must be greater than zero");
        self.growth_increment = bytes;
        Ok(())
    }

    /// True once a remap has failed; the writer then refuses to mutate.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Path of the backing file, or `None` when opened from a descriptor.
    pub fn path(&self) -> Option<&Path> {
        self.store.path()
    }

    /// The data written so far, `[0, size())`.
    pub fn as_slice(&self) -> &[u8] {
        &self.region.as_slice()[..self.len]
    }

    /// Up to `len` bytes starting at `offset`, clamped to `size()`.
    pub fn view(&self, offset: usize, len: usize) -> &[u8] {
        let data = self.as_slice();
        if offset >= data.len() {
            return &[];
        }
        let end = offset + len.min(data.len() - offset);
        &data[offset..end]
    }

    /// Moves the cursor to `pos`, growing first if `pos` is beyond capacity.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.ensure_usable()?;
        self.ensure_capacity(pos)?;

        self.pos = pos;
        self.len = self.len.max(pos);
        Ok(())
    }

    /// Moves the cursor relative to `anchor` and returns the new position.
    ///
    /// Results below zero clamp to zero. `Anchor::End` is the logical size,
    /// not the capacity.
    pub fn seek_relative(&mut self, offset: i64, anchor: Anchor) -> Result<usize> {
        let pos = resolve_offset(offset, anchor, self.pos, self.len);
        self.seek(pos)?;
        Ok(pos)
    }

    /// Copies `buf` at the cursor and advances it.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_usable()?;

        let start = self.pos;
        let end = span_end(start, buf.len())?;
        self.ensure_capacity(end)?;

        self.region.as_mut_slice()[start..end].copy_from_slice(buf);
        self.pos = end;
        self.len = self.len.max(end);
        Ok(())
    }

    /// Copies `buf` at `offset` without moving the cursor.
    pub fn write_at(&mut self, offset: usize, buf: &[u8]) -> Result<()> {
        self.ensure_usable()?;

        let end = span_end(offset, buf.len())?;
        self.ensure_capacity(end)?;

        self.region.as_mut_slice()[offset..end].copy_from_slice(buf);
        self.len = self.len.max(end);
        Ok(())
    }

    /// Grows capacity to at least `capacity` bytes without writing.
    ///
    /// Reserving once before a burst of writes replaces many small remaps
    /// with one; the resulting file content is identical either way.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        self.ensure_usable()?;
        self.ensure_capacity(capacity)
    }

    /// Drops the slack beyond `size()` from the mapping and the file.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.ensure_usable()?;

        let from = self.capacity();
        if from == self.len {
            return Ok(());
        }

        self.region
            .remap(self.store.file(), self.len)
            .wrap_err_with(|| format!("failed to shrink mapping of '{}'", self.store.name()))?;

        if let Err(err) = self.store.resize(self.len) {
            // The file still holds `from` bytes; map them again so capacity
            // keeps matching the file.
            if let Err(restore) = self.region.remap(self.store.file(), from) {
                self.failed = true;
                warn!(
                    file = %self.store.name(),
                    error = %restore,
                    "failed to restore mapping after truncate failure"
                );
            }
            return Err(err);
        }

        debug!(
            file = %self.store.name(),
            from,
            to = self.len,
            "shrank mmap writer"
        );
        Ok(())
    }

    /// Writes dirty pages in `[0, size())` back to the file.
    ///
    /// Does not change the cursor, size, or capacity.
    pub fn flush(&self, mode: SyncMode) -> Result<()> {
        self.region
            .sync(self.len, mode)
            .wrap_err_with(|| format!("failed to flush '{}'", self.store.name()))
    }

    /// Unmaps, truncates the file to `size()`, and closes the descriptor.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Unmap before touching the file length or closing the descriptor.
        drop(std::mem::take(&mut self.region));

        if self.len < self.store.len() {
            self.store.resize(self.len)?;
        }
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        ensure!(
            !self.failed,
            "writer for '{}' is unusable after a failed remap; reopen the file",
            self.store.name()
        );
        Ok(())
    }

    fn ensure_capacity(&mut self, required: usize) -> Result<()> {
        let from = self.capacity();
        if required <= from {
            return Ok(());
        }

        let to = next_capacity(from, required, self.growth_increment)?;

        self.store.resize(to)?;

        if let Err(err) = self.region.remap(self.store.file(), to) {
            self.failed = true;
            return Err(err.wrap_err(format!(
                "failed to grow '{}' from {} to {} bytes",
                self.store.name(),
                from,
                to
            )));
        }

        debug!(
            file = %self.store.name(),
            from,
            to,
            required,
            "grew mmap writer"
        );
        Ok(())
    }
}

impl Drop for MmapWriter {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(
                file = %self.store.name(),
                size = self.len,
                error = %format!("{:#}", err),
                "failed to truncate file on close"
            );
        }
    }
}

fn span_end(offset: usize, len: usize) -> Result<usize> {
    offset
        .checked_add(len)
        .ok_or_else(|| eyre!("write of {} bytes at offset {} overflows", len, offset))
}
