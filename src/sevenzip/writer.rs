//! The 7z container writer (C6): reserves the signature header, appends
//! each solid unit's packed bytes as the scheduler finishes them, then
//! writes the header (itself LZMA2-compressed) and the final signature.
//!
//! Grounded on the teacher's `write/mod.rs`/`write/writer_init.rs`
//! (reserve-then-rewind-to-finalize shape) and `format/mod.rs`'s
//! `SIGNATURE`/`SIGNATURE_HEADER_SIZE`/`property_id` constants.

use std::io::{self, Seek, SeekFrom, Write};

use crate::checksum::Crc32;
use crate::format::{SIGNATURE, SIGNATURE_HEADER_SIZE};
use crate::interrupt::InterruptFlag;
use crate::lzma::{self, Lzma2Params};
use crate::matchfinder::{MatchFinder, SearchConfig};
use crate::model::{CoderInfo, DataUnit, FileRecord};

use super::header::build_header;

/// Writes the 32-byte signature header, then streams solid-unit data,
/// and finally the compressed header plus header-header on [`finish`](Self::finish).
pub struct SevenZipWriter<W: Write + Seek> {
    out: W,
    units: Vec<DataUnit>,
    files: Vec<FileRecord>,
}

impl<W: Write + Seek> SevenZipWriter<W> {
    /// Reserves the 32-byte signature header (written for real in
    /// [`finish`](Self::finish)) and positions the stream for unit data.
    pub fn new(mut out: W) -> io::Result<Self> {
        out.write_all(&[0u8; SIGNATURE_HEADER_SIZE as usize])?;
        Ok(Self { out, units: Vec::new(), files: Vec::new() })
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.out.stream_position()
    }

    /// Appends one finished solid unit's packed bytes and records its
    /// metadata plus the [`FileRecord`]s it covers.
    pub fn append_unit(&mut self, data: &[u8], mut unit: DataUnit, files: &[FileRecord]) -> io::Result<()> {
        unit.first_file = self.files.len();
        self.files.extend_from_slice(files);
        unit.end_file = self.files.len();
        self.out.write_all(data)?;
        self.units.push(unit);
        Ok(())
    }

    /// Builds the header, compresses it through the same LZMA2 encoder
    /// used for unit data, writes the header-header, and rewinds to
    /// write the signature header last.
    pub fn finish(mut self) -> io::Result<W> {
        let header_bytes = build_header(&self.units, &self.files);

        let params = Lzma2Params { lc: 3, lp: 0, pb: 2, fast_length: 64, dictionary_size: 1 << 20 };
        let mf = MatchFinder::build(&header_bytes, 0, SearchConfig::new(32, 1));
        let interrupt = InterruptFlag::new();
        let mut compressed_header = Vec::new();
        lzma::encode_range(&header_bytes, 0, header_bytes.len(), &params, &mf, &interrupt, true, &mut compressed_header)?;
        lzma::lzma2::write_end_marker(&mut compressed_header)?;

        // The compressed header is packed data, like a unit's payload;
        // `pack_pos` in the header-header's PackInfo is relative to the
        // start of packed data (byte 32), same convention as a DataUnit.
        let pack_pos = self.out.stream_position()? - SIGNATURE_HEADER_SIZE;
        self.out.write_all(&compressed_header)?;

        // NextHeader itself is the small, uncompressed kEncodedHeader
        // descriptor pointing back at the blob just written.
        let next_header_offset = self.out.stream_position()? - SIGNATURE_HEADER_SIZE;
        let header_header = build_header_header(
            pack_pos,
            compressed_header.len() as u64,
            header_bytes.len() as u64,
            &lzma::coder_info(&params),
        );
        self.out.write_all(&header_header)?;

        let next_header_size = header_header.len() as u64;
        let next_header_crc = Crc32::compute(&header_header);

        let mut signature = [0u8; SIGNATURE_HEADER_SIZE as usize];
        signature[0..6].copy_from_slice(SIGNATURE);
        signature[6] = 0;
        signature[7] = 3;
        signature[12..20].copy_from_slice(&next_header_offset.to_le_bytes());
        signature[20..28].copy_from_slice(&next_header_size.to_le_bytes());
        signature[28..32].copy_from_slice(&next_header_crc.to_le_bytes());
        let start_crc = Crc32::compute(&signature[12..32]);
        signature[8..12].copy_from_slice(&start_crc.to_le_bytes());

        self.out.seek(SeekFrom::Start(0))?;
        self.out.write_all(&signature)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Wraps an encoded header as `kEncodedHeader` info so the signature
/// header's offset/size point at a single, self-describing folder.
fn build_header_header(pack_pos: u64, compressed_len: u64, unpack_size: u64, coder: &CoderInfo) -> Vec<u8> {
    use crate::format::property_id;
    use super::varint::write_number;

    let mut h = Vec::new();
    h.push(property_id::ENCODED_HEADER);
    h.push(property_id::PACK_INFO);
    write_number(&mut h, pack_pos);
    write_number(&mut h, 1);
    h.push(property_id::SIZE);
    write_number(&mut h, compressed_len);
    h.push(property_id::END);

    h.push(property_id::UNPACK_INFO);
    h.push(property_id::FOLDER);
    write_number(&mut h, 1);
    h.push(0);
    let flags = coder.method_id.len() as u8 | if coder.properties.is_some() { 0x20 } else { 0 };
    h.push(flags);
    h.extend_from_slice(&coder.method_id);
    if let Some(props) = &coder.properties {
        write_number(&mut h, props.len() as u64);
        h.extend_from_slice(props);
    }
    h.push(property_id::CODERS_UNPACK_SIZE);
    write_number(&mut h, unpack_size);
    h.push(property_id::END);
    h.push(property_id::END);
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DirPool;
    use std::io::Cursor;

    #[test]
    fn finishing_an_empty_archive_writes_a_valid_signature() {
        let writer = SevenZipWriter::new(Cursor::new(Vec::new())).unwrap();
        let cursor = writer.finish().unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(&bytes[0..6], SIGNATURE);
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7], 3);
        let start_crc = Crc32::compute(&bytes[12..32]);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), start_crc);
    }

    #[test]
    fn appending_a_unit_advances_the_output_position() {
        let mut writer = SevenZipWriter::new(Cursor::new(Vec::new())).unwrap();
        let mut pool = DirPool::new();
        let file = FileRecord {
            dir: pool.intern(""),
            name: "hello.txt".into(),
            root_offset: 0,
            ext_index: 0,
            size: 6,
            crc32: 0x3196_3516,
            mtime: None,
            ctime: None,
            attributes: None,
        };
        let unit = DataUnit {
            out_file_pos: SIGNATURE_HEADER_SIZE,
            unpack_size: 6,
            pack_size: 20,
            first_file: 0,
            end_file: 0,
            lzma2: CoderInfo::simple(vec![0x21], Some(vec![0x5D])),
            bcj: None,
            used_bcj: false,
        };
        writer.append_unit(&[0u8; 20], unit, std::slice::from_ref(&file)).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() > SIGNATURE_HEADER_SIZE as usize + 20);
    }
}
