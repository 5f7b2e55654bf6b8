//! Core data model shared across the scheduler, encoder, and container
//! writer: file records, solid-unit metadata, and coder descriptors.

use std::sync::Arc;

/// A directory path, interned so that multiple [`FileRecord`]s belonging to
/// the same directory share one allocation instead of each holding a copy.
pub type InternedDir = Arc<str>;

/// A pool that interns directory strings by content.
///
/// Two calls to [`DirPool::intern`] with equal strings return the same
/// [`Arc<str>`] allocation, so directories shared by many files cost one
/// allocation instead of one per file.
#[derive(Debug, Default)]
pub struct DirPool {
    seen: std::collections::HashMap<String, InternedDir>,
}

impl DirPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `dir`, returning a cheaply-cloneable handle.
    pub fn intern(&mut self, dir: &str) -> InternedDir {
        if let Some(existing) = self.seen.get(dir) {
            return existing.clone();
        }
        let handle: InternedDir = Arc::from(dir);
        self.seen.insert(dir.to_string(), handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// One entry discovered by traversal.
///
/// Mutated only to record `size` and `crc32` as bytes are actually read;
/// everything else is fixed once the entry is created.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Interned directory path, not yet trimmed by `root_offset`.
    pub dir: InternedDir,
    /// File name within `dir`, including its extension.
    pub name: String,
    /// Number of leading characters of `dir` to strip when storing the
    /// archive path (used to support relative/"store full paths" modes).
    pub root_offset: usize,
    /// 1-based index into the fixed extension table, 0 if unrecognized.
    pub ext_index: u32,
    /// Byte length of content, filled in as the file is read.
    pub size: u64,
    /// CRC-32 of content, filled in as the file is read.
    pub crc32: u32,
    /// Last-modification time, 100ns ticks since the Windows epoch, to
    /// match the 7z on-disk representation.
    pub mtime: Option<u64>,
    /// Creation time, same tick scale as `mtime`.
    pub ctime: Option<u64>,
    /// Platform attribute bits, if captured.
    pub attributes: Option<u32>,
}

impl FileRecord {
    /// The portion of `name` before the last `.`, used as the sort key
    /// that groups similarly-named files together within an extension.
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(0) | None => &self.name,
            Some(idx) => &self.name[..idx],
        }
    }

    /// The archive-relative path: `dir` with the first `root_offset`
    /// characters stripped, followed by `name`.
    pub fn stored_path(&self) -> String {
        let mut path = String::with_capacity(self.dir.len() - self.root_offset + 1 + self.name.len());
        path.push_str(&self.dir[self.root_offset..]);
        if !path.is_empty() && !path.ends_with(['/', '\\']) {
            path.push('/');
        }
        path.push_str(&self.name);
        path
    }

    /// Whether this record's extension places it in the executable group.
    pub fn is_exe(&self) -> bool {
        crate::ext_table::is_exe_group(self.ext_index)
    }
}

/// A method identifier and its properties, as embedded verbatim in the 7z
/// header for one coder of a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoderInfo {
    /// Variable-length method id, e.g. `[0x21]` for LZMA2.
    pub method_id: Vec<u8>,
    /// Method-specific properties blob, if any.
    pub properties: Option<Vec<u8>>,
    pub num_in_streams: u32,
    pub num_out_streams: u32,
}

impl CoderInfo {
    pub fn simple(method_id: impl Into<Vec<u8>>, properties: Option<Vec<u8>>) -> Self {
        Self {
            method_id: method_id.into(),
            properties,
            num_in_streams: 1,
            num_out_streams: 1,
        }
    }

    /// A coder is "complex" when it has anything other than one input and
    /// one output stream; complex coders must list their stream counts
    /// explicitly in the header.
    pub fn is_complex(&self) -> bool {
        self.num_in_streams != 1 || self.num_out_streams != 1
    }
}

/// Metadata describing one solid block written to the archive.
#[derive(Debug, Clone)]
pub struct DataUnit {
    /// Byte offset in the output file where this unit's packed data begins.
    pub out_file_pos: u64,
    /// Sum of the uncompressed sizes of the files in this unit.
    pub unpack_size: u64,
    /// Number of bytes this unit occupies in the output file.
    pub pack_size: u64,
    /// Index of the first file (in the scheduler's sorted file list)
    /// belonging to this unit.
    pub first_file: usize,
    /// Index one past the last file belonging to this unit.
    pub end_file: usize,
    /// LZMA2 coder descriptor for this unit.
    pub lzma2: CoderInfo,
    /// BCJ coder descriptor, present iff `used_bcj` is true.
    pub bcj: Option<CoderInfo>,
    pub used_bcj: bool,
}

impl DataUnit {
    pub fn file_count(&self) -> usize {
        self.end_file - self.first_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_pool_interns_equal_strings() {
        let mut pool = DirPool::new();
        let a = pool.intern("src/foo");
        let b = pool.intern("src/foo");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn base_name_strips_extension() {
        let mut pool = DirPool::new();
        let rec = FileRecord {
            dir: pool.intern(""),
            name: "archive.tar.gz".into(),
            root_offset: 0,
            ext_index: 0,
            size: 0,
            crc32: 0,
            mtime: None,
            ctime: None,
            attributes: None,
        };
        assert_eq!(rec.base_name(), "archive.tar");
    }

    #[test]
    fn stored_path_strips_root_offset() {
        let mut pool = DirPool::new();
        let rec = FileRecord {
            dir: pool.intern("/home/user/project"),
            name: "main.rs".into(),
            root_offset: "/home/user/".len(),
            ext_index: 0,
            size: 0,
            crc32: 0,
            mtime: None,
            ctime: None,
            attributes: None,
        };
        assert_eq!(rec.stored_path(), "project/main.rs");
    }

    #[test]
    fn coder_info_complex_flag() {
        let simple = CoderInfo::simple(vec![0x21], None);
        assert!(!simple.is_complex());
        let complex = CoderInfo {
            num_in_streams: 4,
            ..CoderInfo::simple(vec![0x03, 0x03, 0x01, 0x1B], None)
        };
        assert!(complex.is_complex());
    }
}
