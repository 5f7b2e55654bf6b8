//! Error types for archive creation.
//!
//! This module provides the [`Error`] enum covering every failure mode
//! described by the session's error-handling policy, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Propagation policy
//!
//! - [`Error::IoOpen`] and [`Error::IoRead`] raised before any bytes of the
//!   current file have reached the output are recoverable: the caller logs
//!   a warning, drops the file, and the session continues.
//! - The same errors raised after output has been produced for the file are
//!   fatal and propagate with the offending path.
//! - [`Error::IoWrite`] and [`Error::OutOfMemory`] are always fatal.
//! - [`Error::NameCollision`] and [`Error::ArchiveExists`] are fatal at
//!   preparation time, before the output file is touched.
//! - [`Error::Interrupted`] is fatal; the caller is responsible for removing
//!   any archive file it created before returning it to the user.
use std::io;
use std::path::PathBuf;

/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes produced while preparing, compressing, or writing an
/// archive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command-line argument or option was malformed or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Opening a file for reading failed.
    #[error("failed to open {path}: {source}")]
    IoOpen { path: PathBuf, source: io::Error },

    /// Reading from an already-open file failed.
    #[error("failed to read {path}: {source}")]
    IoRead { path: PathBuf, source: io::Error },

    /// Writing to the output archive failed.
    #[error("failed to write archive: {0}")]
    IoWrite(io::Error),

    /// A read failure occurred after bytes for the same file had already
    /// been flushed to the output; the unit in progress cannot be salvaged.
    #[error("unrecoverable read failure mid-file {path}: {source}")]
    IoUnrecoverableMidFile { path: PathBuf, source: io::Error },

    /// An allocation failed.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Two input entries reduced to the same stored archive path.
    #[error("name collision: {path}")]
    NameCollision { path: PathBuf },

    /// The destination archive already exists.
    #[error("archive already exists: {0}")]
    ArchiveExists(PathBuf),

    /// The session was cancelled via the interrupt flag.
    #[error("interrupted")]
    Interrupted,
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::IoWrite(source)
    }
}

impl Error {
    /// The process exit code this error maps to, per the CLI contract:
    /// zero only for full success, non-zero otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => 2,
            Error::IoOpen { .. } | Error::IoRead { .. } | Error::IoWrite(_) => 1,
            Error::IoUnrecoverableMidFile { .. } => 1,
            Error::OutOfMemory(_) => 1,
            Error::NameCollision { .. } => 2,
            Error::ArchiveExists(_) => 2,
            Error::Interrupted => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_nonzero() {
        let errs: Vec<Error> = vec![
            Error::InvalidArgument("bad".into()),
            Error::NameCollision { path: "a.txt".into() },
            Error::ArchiveExists("out.7z".into()),
            Error::Interrupted,
        ];
        for e in errs {
            assert_ne!(e.exit_code(), 0);
        }
    }

    #[test]
    fn interrupted_uses_130() {
        assert_eq!(Error::Interrupted.exit_code(), 130);
    }
}
