//! # radyx
//!
//! A multi-threaded archiver that compresses a file list into a 7z
//! container using a radix match finder, LZMA2, and an optional x86 BCJ
//! filter for executables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use radyx::{FileRecord, InterruptFlag, Options, Scheduler};
//! use radyx::model::DirPool;
//! use std::fs::File;
//!
//! fn main() -> radyx::error::Result<()> {
//!     let mut pool = DirPool::new();
//!     let files = vec![FileRecord {
//!         dir: pool.intern("."),
//!         name: "Cargo.toml".into(),
//!         root_offset: 0,
//!         ext_index: radyx::ext_table::lookup("toml"),
//!         size: 0,
//!         crc32: 0,
//!         mtime: None,
//!         ctime: None,
//!         attributes: None,
//!     }];
//!
//!     let out = File::create("out.7z").map_err(|e| radyx::error::Error::IoWrite(e))?;
//!     let scheduler = Scheduler::new(out, Options::default(), InterruptFlag::new())?;
//!     scheduler.run(files)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`matchfinder`]: the radix match finder, a match-link table built
//!   over the dictionary window.
//! - [`lzma`]: range coding, the probability model, price-guided parsing,
//!   LZMA2 chunk framing, and the multi-threaded top-level encoder.
//! - [`bcj`] / [`filter`]: the x86 branch/call/jump filter and the
//!   pipeline that runs it ahead of LZMA2 for executables.
//! - [`dictionary`]: the overlap buffer that holds one solid unit's
//!   active window while filters and the match finder run over it.
//! - [`scheduler`]: owns the session — file-list preparation, solid-unit
//!   boundaries, the per-file read loop, and interrupt handling.
//! - [`sevenzip`]: the 7z container writer, including the LZMA2-encoded
//!   header stream and the signature header.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `parallel` | Yes | Multi-threaded match finding and LZMA2 sub-range encoding via rayon |
//! | `cli` | Yes | The `radyx` command-line binary |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod bcj;
pub mod checksum;
pub mod dictionary;
pub mod error;
pub mod ext_table;
pub mod filter;
pub mod interrupt;
pub mod lzma;
pub mod matchfinder;
pub mod model;
pub mod options;
pub mod progress;
pub mod scheduler;
pub mod sevenzip;
pub mod timestamp;

// Shared 7z format constants (signature, property IDs, method IDs);
// see `format::mod` for why this no longer includes decode-side parsing.
mod format;

pub use error::{Error, Result};
pub use interrupt::InterruptFlag;
pub use model::{CoderInfo, DataUnit, DirPool, FileRecord};
pub use options::Options;
pub use scheduler::Scheduler;
pub use timestamp::Timestamp;
