//! # mmapbuf - Growable Memory-Mapped File Buffers
//!
//! mmapbuf writes and reads files through direct memory mappings instead of
//! buffered `read`/`write` calls:
//!
//! - **Zero-copy access**: bytes go straight into (or come straight out of)
//!   the page cache through a shared mapping
//! - **Transparent growth**: the file and its mapping grow in configurable
//!   increments as data is appended or written at arbitrary offsets
//! - **No persisted slack**: on close the file is truncated to exactly the
//!   data written
//!
//! ## Quick Start
//!
//! ```ignore
//! use mmapbuf::{Anchor, MmapReader, MmapWriter, OpenMode, SyncMode};
//!
//! let mut writer = MmapWriter::options()
//!     .mode(OpenMode::Truncate)
//!     .initial_reserve(1 << 20)
//!     .open("./data.bin")?;
//!
//! writer.write(b"Hello, World!")?;
//! writer.write_at(0, b"J")?;
//! writer.seek_relative(0, Anchor::End)?;
//! writer.flush(SyncMode::Sync)?;
//! writer.close()?;
//!
//! let mut reader = MmapReader::open("./data.bin")?;
//! for line in reader.lines(b'\n') {
//!     println!("{}", String::from_utf8_lossy(line));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   MmapWriter          MmapReader    │
//! ├─────────────────────────────────────┤
//! │ GrowthPolicy │ MappedRegion (memmap2)│
//! ├─────────────────────────────────────┤
//! │        BackingStore (File)          │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Platform Support
//!
//! Growth uses `mremap(2)` on Linux and a fresh mapping elsewhere. Opening
//! from a raw descriptor is available on unix targets.
//!
//! ## Module Overview
//!
//! - [`storage`]: Writer, reader, and their building blocks
//! - [`config`]: Defaults and the `WriterOptions` builder

pub mod config;
pub mod storage;

pub use config::{WriterOptions, DEFAULT_GROWTH_INCREMENT};
pub use storage::{Anchor, MmapReader, MmapWriter, OpenMode, SyncMode};
