//! # Storage Module
//!
//! This module provides the memory-mapped building blocks of mmapbuf: a
//! growable writer over a file mapping and a fixed read-only view.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              MmapWriter                   │
//! │   cursor / logical size / capacity        │
//! ├──────────────┬──────────────┬─────────────┤
//! │ GrowthPolicy │ MappedRegion │ BackingStore│
//! │ (pure fn)    │ (MmapMut)    │ (File)      │
//! └──────────────┴──────────────┴─────────────┘
//!
//! ┌───────────────────────────────────────────┐
//! │              MmapReader                   │
//! │   cursor over a fixed read-only Mmap      │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Every mutating writer call first checks whether it needs capacity beyond
//! the current mapping. If so the growth policy picks a new capacity, the
//! backing file is resized, the region is remapped, and only then are bytes
//! copied. Shrinking runs the other way: remap down, then truncate the file.
//!
//! ## Safety Model
//!
//! Remapping invalidates the previous base address. Views into the mapping
//! (`as_slice()`, `view()`) borrow `&self`, and every call that can remap
//! requires `&mut self`, so the borrow checker rejects any view held across a
//! growth or shrink.
//!
//! ## Module Organization
//!
//! - `backing`: File handle with length query and resize (`BackingStore`)
//! - `region`: Live writable mapping with remap and sync (`MappedRegion`)
//! - `growth`: Capacity rounding to whole growth increments
//! - `writer`: The growable writer (`MmapWriter`)
//! - `reader`: Read-only view with line and byte iteration (`MmapReader`)
//!
//! ## Thread Safety
//!
//! Both `MmapWriter` and `MmapReader` are `Send` but every mutating call takes
//! `&mut self`. Sharing across threads needs external synchronization.

mod backing;
mod growth;
mod reader;
mod region;
mod writer;

pub use backing::BackingStore;
pub use growth::next_capacity;
pub use reader::{Bytes, Lines, MmapReader};
pub use region::MappedRegion;
pub use writer::MmapWriter;

/// How an existing file is treated when a writer opens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Reset the file to empty.
    #[default]
    Truncate,
    /// Keep existing bytes; the cursor starts at the current end.
    Append,
}

/// Reference point for relative seeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Current,
    /// The logical end of the data, never the mapped capacity.
    End,
}

/// Durability requested from a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Block until dirty pages reach the backing file.
    #[default]
    Sync,
    /// Schedule write-back and return immediately.
    Async,
}

/// Resolves `offset` against `anchor`, flooring negative results at zero.
///
/// Positive overflow saturates at `usize::MAX`; callers bound the result.
pub(crate) fn resolve_offset(offset: i64, anchor: Anchor, cursor: usize, end: usize) -> usize {
    let base = match anchor {
        Anchor::Start => 0,
        Anchor::Current => cursor,
        Anchor::End => end,
    };

    let magnitude = usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX);
    if offset < 0 {
        base.saturating_sub(magnitude)
    } else {
        base.saturating_add(magnitude)
    }
}
