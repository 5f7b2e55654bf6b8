//! The solid-unit scheduler (module C5): prepares the sorted file list,
//! decides unit boundaries, drives the per-file read loop through the
//! dictionary buffer, and hands each finished unit's compressed bytes to
//! the container writer.
//!
//! Grounded on the teacher's `write/mod.rs` session-orchestration shape
//! (own the file list, the output sink, and the active encoder state;
//! loop units until the file list is exhausted) adapted from that
//! crate's incremental-archive-edit model to this crate's single-pass,
//! solid-unit-at-a-time session.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::PathBuf;

use crate::bcj;
use crate::checksum::Crc32;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::filter::{BcjFilter, FilterPipeline};
use crate::interrupt::InterruptFlag;
use crate::lzma::{self, Lzma2Params};
use crate::matchfinder::{MatchFinder, SearchConfig};
use crate::model::{DataUnit, FileRecord};
use crate::options::{FilterMode, Options, SolidPolicy};
use crate::sevenzip::SevenZipWriter;

/// Sorts, deduplicates, and (unless `store_full_paths` is set) collision-
/// checks a freshly-traversed file list, then re-sorts it into the order
/// solid units are built in.
///
/// Two entries collide when their directory and name compare fs-equal:
/// case-insensitively on Windows, byte-wise elsewhere. Interned
/// directories make this cheap: equal directory strings always share one
/// allocation, so pointer equality after interning is the fast path for
/// the common case and the byte comparison only has to run on the name.
pub fn prepare(mut files: Vec<FileRecord>, store_full_paths: bool) -> Result<Vec<FileRecord>> {
    files.sort_by(|a, b| {
        (std::sync::Arc::as_ptr(&a.dir).cast::<()>() as usize, &a.name)
            .cmp(&(std::sync::Arc::as_ptr(&b.dir).cast::<()>() as usize, &b.name))
    });
    files.dedup_by(|a, b| std::sync::Arc::ptr_eq(&a.dir, &b.dir) && names_equal(&a.name, &b.name));

    if !store_full_paths {
        let mut seen = std::collections::HashSet::new();
        for file in &files {
            let key = canonical_path_key(file);
            if !seen.insert(key) {
                return Err(Error::NameCollision { path: PathBuf::from(file.stored_path()) });
            }
        }
    }

    files.sort_by(|a, b| {
        (a.ext_index, a.base_name(), a.name.as_str()).cmp(&(b.ext_index, b.base_name(), b.name.as_str()))
    });
    Ok(files)
}

fn names_equal(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn canonical_path_key(file: &FileRecord) -> String {
    let path = file.stored_path();
    if cfg!(windows) {
        path.to_ascii_lowercase()
    } else {
        path
    }
}

/// Finds the end (exclusive) of the solid unit starting at `start`,
/// applying the byte-size cap, file-count cap, extension-group boundary,
/// and exe-crossing boundary in that order of precedence.
fn unit_end(files: &[FileRecord], start: usize, options: &Options) -> usize {
    if start >= files.len() {
        return start;
    }

    let file_count_cap = match options.solid {
        SolidPolicy::Off => Some(1usize),
        SolidPolicy::FileCount(n) => Some(n as usize),
        _ => None,
    };
    let byte_cap = match options.solid {
        SolidPolicy::ByteSize(n) => n,
        _ => options.solid_unit_size(),
    };
    let bcj_enabled = !matches!(options.filter_mode, FilterMode::Off);
    let by_extension = matches!(options.solid, SolidPolicy::ByExtension);
    let first_is_exe = options.bcj_applies_to(files[start].ext_index);
    let first_ext = files[start].ext_index;

    // The first file always joins its own unit regardless of caps, so a
    // single oversized file still makes progress instead of stalling the
    // scheduler; every later candidate is checked against the caps
    // *before* being folded in, so a unit never overshoots them.
    let mut unpack_size: u64 = files[start].size;
    let mut count = 1usize;
    let mut i = start + 1;
    while i < files.len() {
        let file = &files[i];
        if bcj_enabled && options.bcj_applies_to(file.ext_index) != first_is_exe {
            break;
        }
        if by_extension && file.ext_index != first_ext {
            break;
        }
        if let Some(cap) = file_count_cap {
            if count >= cap {
                break;
            }
        }
        if unpack_size + file.size > byte_cap {
            break;
        }
        unpack_size += file.size;
        count += 1;
        i += 1;
    }
    i
}

/// Drives one archive-creation session: preparation, unit scheduling,
/// per-file reads, and final container assembly.
pub struct Scheduler<W: Write + Seek> {
    options: Options,
    writer: SevenZipWriter<W>,
    interrupt: InterruptFlag,
}

impl<W: Write + Seek> Scheduler<W> {
    pub fn new(out: W, options: Options, interrupt: InterruptFlag) -> Result<Self> {
        Ok(Self {
            options,
            writer: SevenZipWriter::new(out).map_err(Error::IoWrite)?,
            interrupt,
        })
    }

    /// Runs preparation and the full unit loop over `files`, returning
    /// the finished output sink.
    pub fn run(mut self, files: Vec<FileRecord>) -> Result<W> {
        let files = prepare(files, self.options.store_full_paths)?;

        let mut start = 0;
        while start < files.len() {
            if self.interrupt.is_set() {
                return Err(Error::Interrupted);
            }
            let end = unit_end(&files, start, &self.options);
            self.compress_unit(&files[start..end])?;
            start = end;
        }

        self.writer.finish().map_err(Error::IoWrite)
    }

    /// Reads every file in `unit_files` into one dictionary buffer, runs
    /// the filter pipeline once over the whole unit, compresses it, and
    /// appends the result to the container writer.
    ///
    /// Buffers the entire unit in memory rather than flushing the
    /// encoder every time the dictionary buffer fills mid-unit: units are
    /// capped at `solid_unit_size` (2 GiB by default), which comfortably
    /// fits in memory for the workloads this crate targets, so a read
    /// failure is always encountered before any bytes of the unit have
    /// reached the output and is therefore always the recoverable case
    /// (drop the file, keep going) rather than the unrecoverable
    /// mid-file case.
    fn compress_unit(&mut self, unit_files: &[FileRecord]) -> Result<()> {
        if unit_files.is_empty() {
            return Ok(());
        }

        let use_bcj = self.options.bcj_applies_to(unit_files[0].ext_index);
        let estimated_size: u64 = unit_files.iter().map(|f| f.size).sum();
        let overrun = if use_bcj { bcj::MAX_UNPROCESSED } else { 0 };
        let mut dict = Dictionary::new(estimated_size as usize, overrun);

        let mut kept_files = Vec::with_capacity(unit_files.len());
        for file in unit_files {
            if self.interrupt.is_set() {
                return Err(Error::Interrupted);
            }
            let full_path = PathBuf::from(file.dir.as_ref()).join(&file.name);
            let mut handle = match File::open(&full_path) {
                Ok(handle) => handle,
                Err(source) => {
                    log::warn!("failed to open {}: {source}", full_path.display());
                    continue;
                }
            };

            let read_start = dict.block_end();
            match read_whole_file(&mut dict, &mut handle) {
                Ok(()) => {
                    let read_end = dict.block_end();
                    let mut rec = file.clone();
                    rec.size = (read_end - read_start) as u64;
                    rec.crc32 = Crc32::compute(&dict.window()[read_start..read_end]);
                    kept_files.push(rec);
                }
                Err(source) => {
                    log::warn!("failed to read {}: {source}", full_path.display());
                }
            }
        }

        if kept_files.is_empty() {
            return Ok(());
        }

        let mut pipeline = FilterPipeline::new();
        if use_bcj {
            pipeline.push(Box::new(BcjFilter::new()));
        }
        dict.run_filters(&mut pipeline);

        let unpack_size = dict.block_end() as u64;
        let data = dict.window();

        let out_file_pos = self.writer.position().map_err(Error::IoWrite)?;
        let params = Lzma2Params {
            lc: self.options.lc,
            lp: self.options.lp,
            pb: self.options.pb,
            fast_length: self.options.fast_length,
            dictionary_size: self.options.dictionary_size,
        };
        let search_config = SearchConfig::new(self.options.search_depth as usize, self.options.resolved_thread_count());
        let mf = MatchFinder::build(data, 0, search_config);

        let mut compressed = Vec::new();
        let thread_count = self.options.resolved_thread_count();
        if thread_count > 1 && data.len() >= 0x4000 {
            lzma::encode_parallel(data, 0, data.len(), &params, &mf, &self.interrupt, thread_count, &mut compressed)
                .map_err(Error::IoWrite)?;
        } else {
            lzma::encode_range(data, 0, data.len(), &params, &mf, &self.interrupt, true, &mut compressed)
                .map_err(Error::IoWrite)?;
        }
        lzma::lzma2::write_end_marker(&mut compressed).map_err(Error::IoWrite)?;

        if self.interrupt.is_set() {
            return Err(Error::Interrupted);
        }

        let unit = DataUnit {
            out_file_pos,
            unpack_size,
            pack_size: compressed.len() as u64,
            first_file: 0,
            end_file: 0,
            lzma2: lzma::coder_info(&params),
            bcj: if use_bcj { Some(bcj::coder_info()) } else { None },
            used_bcj: use_bcj,
        };
        self.writer.append_unit(&compressed, unit, &kept_files).map_err(Error::IoWrite)?;
        Ok(())
    }
}

/// Appends one file's entire content to the dictionary buffer via
/// [`Dictionary::read_into`].
fn read_whole_file(dict: &mut Dictionary, handle: &mut File) -> std::io::Result<()> {
    loop {
        let n = dict.read_into(handle)?;
        if n == 0 || dict.available_space() == 0 {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirPool;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn file(pool: &mut DirPool, dir: &str, name: &str, size: u64, ext_index: u32) -> FileRecord {
        FileRecord {
            dir: pool.intern(dir),
            name: name.to_string(),
            root_offset: 0,
            ext_index,
            size,
            crc32: 0,
            mtime: None,
            ctime: None,
            attributes: None,
        }
    }

    #[test]
    fn prepare_sorts_and_deduplicates_equal_entries() {
        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, "a", "b.txt", 1, 0),
            file(&mut pool, "a", "b.txt", 1, 0),
            file(&mut pool, "a", "a.txt", 1, 0),
        ];
        let prepared = prepare(files, true).unwrap();
        assert_eq!(prepared.len(), 2);
    }

    #[test]
    fn prepare_rejects_colliding_stored_paths_when_full_paths_are_off() {
        let mut pool = DirPool::new();
        let mut a = file(&mut pool, "dirA", "f.txt", 1, 0);
        a.root_offset = a.dir.len();
        let mut b = file(&mut pool, "dirB", "f.txt", 1, 0);
        b.root_offset = b.dir.len();
        let err = prepare(vec![a, b], false).unwrap_err();
        assert!(matches!(err, Error::NameCollision { .. }));
    }

    #[test]
    fn unit_end_splits_on_byte_size_cap() {
        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, "", "a.txt", 10, 0),
            file(&mut pool, "", "b.txt", 10, 0),
            file(&mut pool, "", "c.txt", 10, 0),
        ];
        let mut options = Options::default();
        options.solid = SolidPolicy::ByteSize(15);
        let end = unit_end(&files, 0, &options);
        assert_eq!(end, 1);
    }

    #[test]
    fn unit_end_splits_on_file_count_cap() {
        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, "", "a.txt", 1, 0),
            file(&mut pool, "", "b.txt", 1, 0),
            file(&mut pool, "", "c.txt", 1, 0),
        ];
        let mut options = Options::default();
        options.solid = SolidPolicy::FileCount(2);
        let end = unit_end(&files, 0, &options);
        assert_eq!(end, 2);
    }

    #[test]
    fn unit_end_splits_when_crossing_into_the_exe_group() {
        let mut pool = DirPool::new();
        let exe_idx = crate::ext_table::lookup("exe");
        let files = vec![file(&mut pool, "", "a.txt", 1, 0), file(&mut pool, "", "b.exe", 1, exe_idx)];
        let options = Options::default();
        let end = unit_end(&files, 0, &options);
        assert_eq!(end, 1);
    }

    #[test]
    fn unit_end_off_policy_gives_every_file_its_own_unit() {
        let mut pool = DirPool::new();
        let files = vec![file(&mut pool, "", "a.txt", 1, 0), file(&mut pool, "", "b.txt", 1, 0)];
        let mut options = Options::default();
        options.solid = SolidPolicy::Off;
        assert_eq!(unit_end(&files, 0, &options), 1);
    }

    #[test]
    fn full_session_writes_a_readable_signature_over_two_small_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello world").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"goodbye world").unwrap();

        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, dir.path().to_str().unwrap(), "a.txt", 11, 0),
            file(&mut pool, dir.path().to_str().unwrap(), "b.txt", 13, 0),
        ];

        let scheduler = Scheduler::new(Cursor::new(Vec::new()), Options::default(), InterruptFlag::new()).unwrap();
        let out = scheduler.run(files).unwrap();
        let bytes = out.into_inner();
        assert_eq!(&bytes[0..6], crate::format::SIGNATURE);
        assert!(bytes.len() > crate::format::SIGNATURE_HEADER_SIZE as usize);
    }

    #[test]
    fn missing_file_is_skipped_rather_than_failing_the_session() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("present.txt"), b"data").unwrap();

        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, dir.path().to_str().unwrap(), "present.txt", 4, 0),
            file(&mut pool, dir.path().to_str().unwrap(), "missing.txt", 4, 0),
        ];

        let scheduler = Scheduler::new(Cursor::new(Vec::new()), Options::default(), InterruptFlag::new()).unwrap();
        let out = scheduler.run(files).unwrap();
        assert!(out.into_inner().len() > crate::format::SIGNATURE_HEADER_SIZE as usize);
    }

    #[test]
    fn interrupted_session_returns_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let mut pool = DirPool::new();
        let files = vec![file(&mut pool, dir.path().to_str().unwrap(), "a.txt", 5, 0)];

        let interrupt = InterruptFlag::new();
        interrupt.set();
        let scheduler = Scheduler::new(Cursor::new(Vec::new()), Options::default(), interrupt).unwrap();
        let err = scheduler.run(files).unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }
}
