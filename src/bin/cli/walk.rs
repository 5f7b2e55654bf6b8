//! Turns the command line's input paths into [`FileRecord`]s, applying
//! the recursion policy and the include/exclude selector as it goes.
//!
//! Grounded on the teacher's walk-and-select loop (`FileSelector` applied
//! per discovered entry) generalized to also stat each file up front,
//! since [`radyx::scheduler::unit_end`] needs `size` before any byte of
//! the file has been read.

use std::fs;
use std::path::{Path, PathBuf};

use radyx::model::{DirPool, FileRecord};
use radyx::{Timestamp, ext_table};
use walkdir::WalkDir;

use crate::cli::selector::{Recursion, Selector};

/// Walks every input path, returning the file records to archive. I/O
/// errors while stat'ing or walking are logged and the offending entry is
/// skipped; they are not fatal at this stage (the archive has not been
/// touched yet).
pub fn collect(
    inputs: &[PathBuf],
    selector: &Selector,
    recursion: Recursion,
    store_full_paths: bool,
    pool: &mut DirPool,
) -> Vec<FileRecord> {
    let mut out = Vec::new();
    for input in inputs {
        let strip_prefix = if store_full_paths {
            String::new()
        } else {
            input.parent().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
        };

        let metadata = match fs::symlink_metadata(input) {
            Ok(m) => m,
            Err(source) => {
                log::warn!("failed to stat {}: {source}", input.display());
                continue;
            }
        };

        if metadata.is_dir() {
            let max_depth = match recursion {
                Recursion::None => 1,
                Recursion::Full | Recursion::NamedOnly => usize::MAX,
            };
            for entry in WalkDir::new(input).max_depth(max_depth).into_iter() {
                let entry = match entry {
                    Ok(e) => e,
                    Err(source) => {
                        log::warn!("failed to walk entry under {}: {source}", input.display());
                        continue;
                    }
                };
                if entry.file_type().is_dir() {
                    continue;
                }
                add_entry(entry.path(), &strip_prefix, selector, store_full_paths, pool, &mut out);
            }
        } else {
            add_entry(input, &strip_prefix, selector, store_full_paths, pool, &mut out);
        }
    }
    out
}

fn add_entry(
    path: &Path,
    strip_prefix: &str,
    selector: &Selector,
    store_full_paths: bool,
    pool: &mut DirPool,
    out: &mut Vec<FileRecord>,
) {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(source) => {
            log::warn!("failed to stat {}: {source}", path.display());
            return;
        }
    };
    if !metadata.is_file() {
        return;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("")).to_string_lossy().into_owned();
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_owned(),
        None => {
            log::warn!("skipping non-UTF-8 file name: {}", path.display());
            return;
        }
    };

    let root_offset = if store_full_paths {
        0
    } else {
        (strip_prefix.len() + 1).min(dir.len())
    };

    if !selector.is_trivial() {
        let mut relative = dir[root_offset..].to_owned();
        if !relative.is_empty() && !relative.ends_with(['/', '\\']) {
            relative.push('/');
        }
        relative.push_str(&name);
        if !selector.matches(&relative) {
            return;
        }
    }

    let ext_index = path
        .extension()
        .and_then(|e| e.to_str())
        .map(ext_table::lookup)
        .unwrap_or(0);

    out.push(FileRecord {
        dir: pool.intern(&dir),
        name,
        root_offset,
        ext_index,
        size: metadata.len(),
        crc32: 0,
        mtime: Timestamp::from_system_time(metadata.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH)).map(|t| t.as_filetime()),
        ctime: metadata
            .created()
            .ok()
            .and_then(Timestamp::from_system_time)
            .map(|t| t.as_filetime()),
        attributes: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_a_flat_set_of_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"hello").unwrap();
        fs::write(&b, b"world").unwrap();

        let mut pool = DirPool::new();
        let selector = Selector::new();
        let records = collect(&[a, b], &selector, Recursion::NamedOnly, false, &mut pool);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.size == 5));
    }

    #[test]
    fn recurses_into_directories_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/nested.txt"), b"x").unwrap();

        let mut pool = DirPool::new();
        let selector = Selector::new();
        let records = collect(&[dir.path().to_path_buf()], &selector, Recursion::NamedOnly, false, &mut pool);
        assert_eq!(records.len(), 1);
        assert!(records[0].stored_path().ends_with("sub/nested.txt"));
    }

    #[test]
    fn no_recursion_skips_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/nested.txt"), b"x").unwrap();
        fs::write(dir.path().join("top.txt"), b"y").unwrap();

        let mut pool = DirPool::new();
        let selector = Selector::new();
        let records = collect(&[dir.path().to_path_buf()], &selector, Recursion::None, false, &mut pool);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn selector_filters_discovered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();
        fs::write(dir.path().join("b.log"), b"y").unwrap();

        let mut pool = DirPool::new();
        let mut selector = Selector::new();
        selector.add_include_pattern("*.txt").unwrap();
        let records = collect(&[dir.path().to_path_buf()], &selector, Recursion::NamedOnly, false, &mut pool);
        assert_eq!(records.len(), 1);
        assert!(records[0].name.ends_with(".txt"));
    }
}
