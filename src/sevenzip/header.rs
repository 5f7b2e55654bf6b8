//! Builds the in-memory 7z header byte stream: streams info (pack sizes,
//! folders/coders, substream sizes and CRCs) followed by files info
//! (names, empty-stream bitmap, timestamps, attributes).
//!
//! Adapted from the teacher's `write/header_encode.rs`, stripped of its
//! BCJ2/AES/multi-folder-per-file branches (this crate writes exactly
//! one folder per solid unit, with at most one LZMA2 coder and one
//! optional BCJ coder ahead of it) and driven by [`DataUnit`]/
//! [`FileRecord`] instead of that crate's streams-info accumulator.

use crate::format::property_id;
use crate::model::{CoderInfo, DataUnit, FileRecord};

use super::varint::{pack_bool_vector, write_number, write_utf16le_string};

/// Builds the full header: `kHeader` followed by `MainStreamsInfo` (when
/// any unit carries data) and `FilesInfo`, terminated by `kEnd`.
pub fn build_header(units: &[DataUnit], files: &[FileRecord]) -> Vec<u8> {
    let mut header = Vec::new();
    header.push(property_id::HEADER);

    if !units.is_empty() {
        header.push(property_id::MAIN_STREAMS_INFO);
        write_pack_info(&mut header, units);
        write_unpack_info(&mut header, units);
        write_substreams_info(&mut header, units, files);
        header.push(property_id::END);
    }

    write_files_info(&mut header, files);
    header.push(property_id::END);
    header
}

fn write_pack_info(header: &mut Vec<u8>, units: &[DataUnit]) {
    header.push(property_id::PACK_INFO);
    write_number(header, 0);
    write_number(header, units.len() as u64);
    header.push(property_id::SIZE);
    for unit in units {
        write_number(header, unit.pack_size);
    }
    header.push(property_id::END);
}

fn write_unpack_info(header: &mut Vec<u8>, units: &[DataUnit]) {
    header.push(property_id::UNPACK_INFO);
    header.push(property_id::FOLDER);
    write_number(header, units.len() as u64);
    header.push(0); // external = 0, folders inline

    for unit in units {
        write_folder(header, unit);
    }

    header.push(property_id::CODERS_UNPACK_SIZE);
    for unit in units {
        write_number(header, unit.unpack_size);
        if unit.used_bcj {
            write_number(header, unit.unpack_size);
        }
    }

    header.push(property_id::END);
}

/// Writes one folder's coder chain: `[BCJ,] LZMA2`, bound so BCJ's output
/// feeds LZMA2's input when present (BCJ is the dictionary-side filter;
/// its single input is file bytes, its single output feeds the
/// compressor, so the bind pair is `(lzma2_input=1, bcj_output=0)`).
fn write_folder(header: &mut Vec<u8>, unit: &DataUnit) {
    let num_coders = if unit.used_bcj { 2 } else { 1 };
    write_number(header, num_coders);

    if let Some(bcj) = &unit.bcj {
        write_coder(header, bcj);
    }
    write_coder(header, &unit.lzma2);

    if unit.used_bcj {
        write_number(header, 1); // lzma2 input index
        write_number(header, 0); // bcj output index
    }
}

fn write_coder(header: &mut Vec<u8>, coder: &CoderInfo) {
    let mut flags = coder.method_id.len() as u8;
    if coder.properties.is_some() {
        flags |= 0x20;
    }
    if coder.is_complex() {
        flags |= 0x10;
    }
    header.push(flags);
    header.extend_from_slice(&coder.method_id);

    if coder.is_complex() {
        write_number(header, coder.num_in_streams as u64);
        write_number(header, coder.num_out_streams as u64);
    }

    if let Some(props) = &coder.properties {
        write_number(header, props.len() as u64);
        header.extend_from_slice(props);
    }
}

/// Writes `SubStreamsInfo`. Per `Container7z.cpp`, `kNumUnpackStream` is
/// only needed when some unit holds more than one file (a unit with
/// exactly one file is assumed to hold one stream without it being
/// spelled out); `kCRC` is independent of that and is written whenever
/// any file in the archive is non-empty, even when every unit holds
/// exactly one file. The whole block is skipped only when there are no
/// units at all, which the caller already guarantees by not calling this
/// when `units` is empty.
fn write_substreams_info(header: &mut Vec<u8>, units: &[DataUnit], files: &[FileRecord]) {
    let has_multi_file_units = units.iter().any(|u| u.file_count() > 1);
    let has_nonempty_file = files.iter().any(|f| f.size > 0);
    if !has_multi_file_units && !has_nonempty_file {
        return;
    }

    header.push(property_id::SUBSTREAMS_INFO);

    if has_multi_file_units {
        header.push(property_id::NUM_UNPACK_STREAM);
        for unit in units {
            write_number(header, unit.file_count() as u64);
        }

        header.push(property_id::SIZE);
        for unit in units {
            let unit_files = &files[unit.first_file..unit.end_file];
            for f in &unit_files[..unit_files.len().saturating_sub(1)] {
                write_number(header, f.size);
            }
        }
    }

    if has_nonempty_file {
        header.push(property_id::CRC);
        header.push(1);
        for unit in units {
            for f in &files[unit.first_file..unit.end_file] {
                header.extend_from_slice(&f.crc32.to_le_bytes());
            }
        }
    }

    header.push(property_id::END);
}

fn write_files_info(header: &mut Vec<u8>, files: &[FileRecord]) {
    header.push(property_id::FILES_INFO);
    write_number(header, files.len() as u64);

    let empty: Vec<bool> = files.iter().map(|f| f.size == 0).collect();
    if empty.iter().any(|&b| b) {
        header.push(property_id::EMPTY_STREAM);
        let packed = pack_bool_vector(&empty);
        write_number(header, packed.len() as u64);
        header.extend_from_slice(&packed);
    }

    header.push(property_id::NAME);
    let mut names = Vec::new();
    names.push(0u8); // external = 0
    for f in files {
        write_utf16le_string(&mut names, &f.stored_path());
    }
    write_number(header, names.len() as u64);
    header.extend_from_slice(&names);

    write_time_property(header, property_id::MTIME, files, |f| f.mtime);
    write_time_property(header, property_id::CTIME, files, |f| f.ctime);

    let has_attrs = files.iter().any(|f| f.attributes.is_some());
    if has_attrs {
        header.push(property_id::WIN_ATTRIBUTES);
        let defined: Vec<bool> = files.iter().map(|f| f.attributes.is_some()).collect();
        let all_defined = defined.iter().all(|&b| b);
        let mut body = Vec::new();
        if all_defined {
            body.push(1);
        } else {
            body.push(0);
            let packed = pack_bool_vector(&defined);
            body.extend_from_slice(&packed);
        }
        body.push(0); // external = 0
        for f in files {
            if let Some(attr) = f.attributes {
                body.extend_from_slice(&attr.to_le_bytes());
            }
        }
        write_number(header, body.len() as u64);
        header.extend_from_slice(&body);
    }

    header.push(property_id::END);
}

fn write_time_property(
    header: &mut Vec<u8>,
    property: u8,
    files: &[FileRecord],
    get: impl Fn(&FileRecord) -> Option<u64>,
) {
    let defined: Vec<bool> = files.iter().map(|f| get(f).is_some()).collect();
    if !defined.iter().any(|&b| b) {
        return;
    }

    header.push(property);
    let all_defined = defined.iter().all(|&b| b);
    let mut body = Vec::new();
    if all_defined {
        body.push(1);
    } else {
        body.push(0);
        let packed = pack_bool_vector(&defined);
        body.extend_from_slice(&packed);
    }
    body.push(0); // external = 0
    for f in files {
        if let Some(ticks) = get(f) {
            body.extend_from_slice(&ticks.to_le_bytes());
        }
    }
    write_number(header, body.len() as u64);
    header.extend_from_slice(&body);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirPool;

    fn unit(first: usize, end: usize, unpack: u64, pack: u64) -> DataUnit {
        DataUnit {
            out_file_pos: 32,
            unpack_size: unpack,
            pack_size: pack,
            first_file: first,
            end_file: end,
            lzma2: CoderInfo::simple(vec![0x21], Some(vec![0x5D])),
            bcj: None,
            used_bcj: false,
        }
    }

    fn file(pool: &mut DirPool, name: &str, size: u64, crc32: u32) -> FileRecord {
        FileRecord {
            dir: pool.intern(""),
            name: name.to_string(),
            root_offset: 0,
            ext_index: 0,
            size,
            crc32,
            mtime: None,
            ctime: None,
            attributes: None,
        }
    }

    #[test]
    fn header_begins_with_header_marker_and_ends_with_end_marker() {
        let mut pool = DirPool::new();
        let files = vec![file(&mut pool, "hello.txt", 6, 0x3196_3516)];
        let units = vec![unit(0, 1, 6, 10)];
        let header = build_header(&units, &files);
        assert_eq!(header[0], property_id::HEADER);
        assert_eq!(*header.last().unwrap(), property_id::END);
    }

    #[test]
    fn empty_archive_skips_main_streams_info() {
        let header = build_header(&[], &[]);
        assert!(!header.contains(&property_id::MAIN_STREAMS_INFO));
        assert!(header.contains(&property_id::FILES_INFO));
    }

    #[test]
    fn multi_file_unit_emits_substreams_info() {
        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, "a.txt", 10, 1),
            file(&mut pool, "b.txt", 20, 2),
        ];
        let units = vec![unit(0, 2, 30, 15)];
        let header = build_header(&units, &files);
        assert!(header.contains(&property_id::SUBSTREAMS_INFO));
    }

    #[test]
    fn zero_byte_file_sets_the_empty_stream_bitmap() {
        let mut pool = DirPool::new();
        let files = vec![file(&mut pool, "empty.txt", 0, 0)];
        let header = build_header(&[], &files);
        assert!(header.contains(&property_id::EMPTY_STREAM));
    }

    #[test]
    fn single_file_per_unit_archive_still_emits_crc() {
        let mut pool = DirPool::new();
        let files = vec![
            file(&mut pool, "a.txt", 10, 0x1111_1111),
            file(&mut pool, "b.txt", 20, 0x2222_2222),
        ];
        let units = vec![unit(0, 1, 10, 5), {
            let mut u = unit(1, 2, 20, 8);
            u.out_file_pos = 37;
            u
        }];
        let header = build_header(&units, &files);
        assert!(header.contains(&property_id::SUBSTREAMS_INFO));
        assert!(!header.contains(&property_id::NUM_UNPACK_STREAM));
        assert!(header.windows(4).any(|w| w == 0x1111_1111u32.to_le_bytes()));
        assert!(header.windows(4).any(|w| w == 0x2222_2222u32.to_le_bytes()));
    }

    #[test]
    fn bcj_folder_emits_two_coders_with_a_bind_pair() {
        let mut pool = DirPool::new();
        let files = vec![file(&mut pool, "a.exe", 100, 1)];
        let mut u = unit(0, 1, 100, 60);
        u.used_bcj = true;
        u.bcj = Some(CoderInfo::simple(vec![0x03, 0x03, 0x01, 0x03], None));
        let header = build_header(&[u], &files);
        assert!(header.contains(&property_id::UNPACK_INFO));
    }
}
