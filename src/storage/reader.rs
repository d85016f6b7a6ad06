//! # Read-Only Mapped View
//!
//! `MmapReader` maps a file read-only at a fixed length and reads from it
//! through a cursor. There is no growth and no remap, so every slice it hands
//! out stays valid for as long as the reader is borrowed.
//!
//! ## Reading
//!
//! - `read()` copies from the cursor and advances it; `read_at()` does not
//! - `next_line()` / `lines()` split on a delimiter byte, excluding it
//! - `next_byte()` / `bytes()` yield one byte at a time
//! - `view()` borrows a sub-range without copying or moving the cursor
//!
//! Iterators start at the cursor and advance it, so a second `lines()` call
//! resumes where the first stopped. `seek(0)` restarts.
//!
//! ## Seeking
//!
//! Seeks use the same anchors as the writer but clamp to `[0, size()]`.

use std::fs::File;
use std::path::Path;

use eyre::{Result, WrapErr};
use memmap2::{Mmap, MmapOptions};

use super::{resolve_offset, Anchor};

#[derive(Debug)]
pub struct MmapReader {
    map: Option<Mmap>,
    pos: usize,
}

impl MmapReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .wrap_err_with(|| format!("failed to open '{}' for reading", path.display()))?;

        Self::map_file(&file).wrap_err_with(|| format!("failed to map '{}'", path.display()))
    }

    /// Maps a caller-owned descriptor. The descriptor is left open.
    #[cfg(unix)]
    pub fn open_fd<F: std::os::fd::AsFd>(fd: F) -> Result<Self> {
        use std::os::fd::AsRawFd;

        let borrowed = fd.as_fd();
        let raw = borrowed.as_raw_fd();

        let file = File::from(
            borrowed
                .try_clone_to_owned()
                .wrap_err_with(|| format!("failed to duplicate fd {}", raw))?,
        );

        Self::map_file(&file).wrap_err_with(|| format!("failed to map fd {}", raw))
    }

    fn map_file(file: &File) -> Result<Self> {
        let len = file
            .metadata()
            .wrap_err("failed to get file metadata")?
            .len();
        let len = usize::try_from(len).wrap_err("file does not fit in the address space")?;

        if len == 0 {
            return Ok(Self { map: None, pos: 0 });
        }

        // SAFETY: MmapOptions::map is unsafe because the file may be truncated
        // or modified externally while mapped. This is safe because:
        // 1. The mapping is private to this reader and read-only
        // 2. The length is fixed at the size observed just before mapping
        // 3. Slices handed out borrow the reader, so they cannot outlive it
        let map = unsafe { MmapOptions::new().len(len).map(file) }
            .wrap_err_with(|| format!("failed to map {} bytes", len))?;

        Ok(Self {
            map: Some(map),
            pos: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.size()
    }

    /// The whole mapped file.
    pub fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Up to `len` bytes from `offset`, clamped to the file. Never moves the
    /// cursor.
    pub fn view(&self, offset: usize, len: usize) -> &[u8] {
        let data = self.as_slice();
        if offset >= data.len() {
            return &[];
        }
        let end = offset + len.min(data.len() - offset);
        &data[offset..end]
    }

    /// Everything from the cursor to the end.
    pub fn remaining(&self) -> &[u8] {
        self.view(self.pos, usize::MAX)
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.size());
    }

    /// Moves the cursor relative to `anchor`, clamped to `[0, size()]`.
    pub fn seek_relative(&mut self, offset: i64, anchor: Anchor) -> usize {
        let size = self.size();
        self.pos = resolve_offset(offset, anchor, self.pos, size).min(size);
        self.pos
    }

    /// Copies into `buf` from the cursor; returns the count copied (0 at end).
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = self.read_at(buf, self.pos);
        self.pos += n;
        n
    }

    /// Copies into `buf` from `offset` without moving the cursor.
    pub fn read_at(&self, buf: &mut [u8], offset: usize) -> usize {
        let src = self.view(offset, buf.len());
        buf[..src.len()].copy_from_slice(src);
        src.len()
    }

    /// Next line up to (not including) `delimiter`, or `None` at end.
    ///
    /// A final line without a trailing delimiter is still returned.
    pub fn next_line(&mut self, delimiter: u8) -> Option<&[u8]> {
        let data: &[u8] = self.map.as_deref().unwrap_or(&[]);
        split_line(data, &mut self.pos, delimiter)
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.as_slice().get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    /// Lines from the cursor onward. Advances the cursor as it goes.
    pub fn lines(&mut self, delimiter: u8) -> Lines<'_> {
        Lines {
            data: self.map.as_deref().unwrap_or(&[]),
            pos: &mut self.pos,
            delimiter,
        }
    }

    /// Bytes from the cursor onward. Advances the cursor as it goes.
    pub fn bytes(&mut self) -> Bytes<'_> {
        Bytes {
            data: self.map.as_deref().unwrap_or(&[]),
            pos: &mut self.pos,
        }
    }
}

fn split_line<'a>(data: &'a [u8], pos: &mut usize, delimiter: u8) -> Option<&'a [u8]> {
    let rest = data.get(*pos..).filter(|rest| !rest.is_empty())?;

    match rest.iter().position(|&b| b == delimiter) {
        Some(at) => {
            *pos += at + 1;
            Some(&rest[..at])
        }
        None => {
            *pos = data.len();
            Some(rest)
        }
    }
}

/// Iterator returned by [`MmapReader::lines`].
#[derive(Debug)]
pub struct Lines<'a> {
    data: &'a [u8],
    pos: &'a mut usize,
    delimiter: u8,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        split_line(self.data, self.pos, self.delimiter)
    }
}

/// Iterator returned by [`MmapReader::bytes`].
#[derive(Debug)]
pub struct Bytes<'a> {
    data: &'a [u8],
    pos: &'a mut usize,
}

impl Iterator for Bytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = self.data.get(*self.pos).copied()?;
        *self.pos += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.data.len().saturating_sub(*self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Bytes<'_> {}
