//! # Backing Store
//!
//! `BackingStore` owns the file handle behind a writer's mapping. It answers
//! "how long is the file" and performs file-level truncate/extend. Closing the
//! handle happens when the store is dropped.
//!
//! ## Descriptor Ownership
//!
//! A store opened from a path owns its descriptor outright. A store built
//! from a caller's descriptor works on a duplicate (`dup(2)`), so dropping the
//! store closes only the duplicate and the caller's descriptor stays valid.
//! Both refer to the same open file description, so resizes are visible
//! through either.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use eyre::{eyre, Result, WrapErr};

use super::OpenMode;

/// Where a store's descriptor came from, for error messages and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Path(PathBuf),
    #[cfg(unix)]
    Descriptor(i32),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Path(path) => write!(f, "{}", path.display()),
            #[cfg(unix)]
            Origin::Descriptor(fd) => write!(f, "fd {}", fd),
        }
    }
}

#[derive(Debug)]
pub struct BackingStore {
    file: File,
    origin: Origin,
    len: usize,
}

impl BackingStore {
    /// Opens (creating if needed) `path` read-write.
    ///
    /// Shared writable mappings need read access as well as write access, so
    /// the file is always opened with both.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(mode == OpenMode::Truncate)
            .open(path)
            .wrap_err_with(|| format!("failed to open '{}'", path.display()))?;

        Self::from_file(file, Origin::Path(path.to_path_buf()), mode)
    }

    /// Builds a store over a duplicate of a caller-owned descriptor.
    ///
    /// The descriptor must be open for both reading and writing.
    #[cfg(unix)]
    pub fn from_fd<F: std::os::fd::AsFd>(fd: F, mode: OpenMode) -> Result<Self> {
        use std::os::fd::AsRawFd;

        let borrowed = fd.as_fd();
        let raw = borrowed.as_raw_fd();

        let owned = borrowed
            .try_clone_to_owned()
            .wrap_err_with(|| format!("failed to duplicate fd {}", raw))?;

        Self::from_file(File::from(owned), Origin::Descriptor(raw), mode)
    }

    fn from_file(file: File, origin: Origin, mode: OpenMode) -> Result<Self> {
        let mut store = Self {
            file,
            origin,
            len: 0,
        };

        match mode {
            OpenMode::Truncate => store.resize(0)?,
            OpenMode::Append => store.len = store.current_length()?,
        }

        Ok(store)
    }

    /// Queries the file's length from the filesystem.
    pub fn current_length(&self) -> Result<usize> {
        let metadata = self
            .file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", self.origin))?;

        usize::try_from(metadata.len()).map_err(|_| {
            eyre!(
                "'{}' is {} bytes, which does not fit in the address space",
                self.origin,
                metadata.len()
            )
        })
    }

    /// Truncates or extends the file to exactly `len` bytes.
    ///
    /// Extension zero-fills. On failure the recorded length is unchanged.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        self.file
            .set_len(len as u64)
            .wrap_err_with(|| format!("failed to resize '{}' to {} bytes", self.origin, len))?;

        self.len = len;
        Ok(())
    }

    /// Length as of the last successful resize (or open).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Path the store was opened from, if it was not built from a descriptor.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::Path(path) => Some(path),
            #[cfg(unix)]
            Origin::Descriptor(_) => None,
        }
    }

    /// Human-readable name of the file for messages.
    pub fn name(&self) -> impl fmt::Display + '_ {
        &self.origin
    }
}
