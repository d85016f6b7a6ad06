//! # Mapped Region
//!
//! `MappedRegion` is the live shared, writable mapping over a backing file.
//! Its only state-changing operation is `remap()`, which grows or shrinks the
//! mapping and may move it to a new base address. Dropping the region unmaps
//! it.
//!
//! ## Remap Strategy
//!
//! On Linux the mapping is resized with `mremap(MREMAP_MAYMOVE)`, which grows
//! in place when the address space allows and relocates otherwise, without
//! copying page contents. Other platforms flush the old mapping and map the
//! file afresh at the new length.
//!
//! A zero-length region holds no mapping at all; the next remap to a non-zero
//! length creates one.
//!
//! ## Invariant
//!
//! The region's length changes only when the remap succeeded. On failure the
//! previous mapping (and its length) stays in place.

use std::fs::File;

use eyre::{Result, WrapErr};
use memmap2::{MmapMut, MmapOptions};

use super::SyncMode;

/// An empty region (`Default`) holds no mapping.
#[derive(Debug, Default)]
pub struct MappedRegion {
    map: Option<MmapMut>,
}

impl MappedRegion {
    /// Maps the first `len` bytes of `file` shared and writable.
    ///
    /// The file must already be at least `len` bytes long.
    pub fn map(file: &File, len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self { map: None });
        }

        Ok(Self {
            map: Some(map_shared(file, len)?),
        })
    }

    pub fn len(&self) -> usize {
        self.map.as_ref().map_or(0, |map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.map.as_deref_mut().unwrap_or(&mut [])
    }

    /// Resizes the mapping to `new_len` bytes.
    ///
    /// When growing, `file` must already be at least `new_len` bytes long.
    /// Bytes below `min(old_len, new_len)` are preserved.
    pub fn remap(&mut self, file: &File, new_len: usize) -> Result<()> {
        let old_len = self.len();
        if new_len == old_len {
            return Ok(());
        }

        if new_len == 0 {
            // munmap happens on drop; MS_SYNC first so nothing dirty is lost
            // if the caller truncates the file right after.
            if let Some(map) = &self.map {
                map.flush().wrap_err("failed to flush mapping before unmap")?;
            }
            self.map = None;
            return Ok(());
        }

        match self.map.as_mut() {
            None => {
                self.map = Some(map_shared(file, new_len)?);
                Ok(())
            }
            Some(map) => resize_mapping(map, file, old_len, new_len),
        }
    }

    /// Writes back dirty pages in `[0, len)`.
    pub fn sync(&self, len: usize, mode: SyncMode) -> Result<()> {
        let Some(map) = &self.map else {
            return Ok(());
        };

        let len = len.min(map.len());
        if len == 0 {
            return Ok(());
        }

        let flushed = match mode {
            SyncMode::Sync => map.flush_range(0, len),
            SyncMode::Async => map.flush_async_range(0, len),
        };

        flushed.wrap_err_with(|| format!("failed to sync {} mapped bytes ({:?})", len, mode))
    }
}

fn map_shared(file: &File, len: usize) -> Result<MmapMut> {
    // SAFETY: MmapOptions::map_mut is unsafe because the file may be modified
    // externally while mapped. This is safe because:
    // 1. The writer owns the file for the mapping's lifetime (single writer)
    // 2. The caller resized the file to at least `len` before mapping
    // 3. The mapping is owned by MappedRegion; slices into it borrow the region
    unsafe {
        MmapOptions::new()
            .len(len)
            .map_mut(file)
            .wrap_err_with(|| format!("failed to map {} bytes", len))
    }
}

#[cfg(target_os = "linux")]
fn resize_mapping(map: &mut MmapMut, _file: &File, old_len: usize, new_len: usize) -> Result<()> {
    use memmap2::RemapOptions;

    // SAFETY: remap may move the mapping, invalidating every pointer into it.
    // This is safe because:
    // 1. remap() takes &mut self on the region, so no slices borrowed from the
    //    mapping can be alive (borrow checker)
    // 2. The file was resized to at least new_len before growing
    // 3. On failure mremap leaves the old mapping intact, and memmap2 keeps
    //    the old length
    unsafe {
        map.remap(new_len, RemapOptions::new().may_move(true))
            .wrap_err_with(|| format!("failed to remap from {} to {} bytes", old_len, new_len))
    }
}

#[cfg(not(target_os = "linux"))]
fn resize_mapping(map: &mut MmapMut, file: &File, old_len: usize, new_len: usize) -> Result<()> {
    map.flush()
        .wrap_err("failed to flush mapping before remap")?;

    let fresh = map_shared(file, new_len)
        .wrap_err_with(|| format!("failed to remap from {} to {} bytes", old_len, new_len))?;

    *map = fresh;
    Ok(())
}
