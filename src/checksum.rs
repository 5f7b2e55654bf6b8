//! CRC-32 checksum computation.
//!
//! CRC-32 (IEEE 802.3 polynomial) is the checksum embedded in 7z archives
//! for both per-file and per-folder integrity verification.
use std::io::{self, Read, Write};

/// Size of the read buffer used by [`Crc32::compute_reader`].
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental CRC-32 calculator.
///
/// # Example
///
/// ```rust
/// use radyx::checksum::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// Computes the CRC-32 of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Computes the CRC-32 by reading a reader to completion.
    pub fn compute_reader<R: Read>(reader: &mut R) -> io::Result<u32> {
        let mut hasher = Self::new();
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(hasher.finalize())
    }
}

/// A writer wrapper that computes a running CRC-32 of everything written
/// through it. Used to checksum file content as it streams into the
/// dictionary buffer, without a second pass over the bytes.
pub struct Crc32Writer<W> {
    inner: W,
    crc: Crc32,
    bytes_written: u64,
}

impl<W> Crc32Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_written: 0,
        }
    }

    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn reset(&mut self) {
        self.crc.reset();
        self.bytes_written = 0;
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: Write> Write for Crc32Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4A_C3D0);
    }

    #[test]
    fn single_tiny_file_vector() {
        // "hello.txt" content from the single-tiny-file scenario.
        assert_eq!(Crc32::compute(b"Hello\n"), 0x3196_3516);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut crc = Crc32::new();
        crc.update(b"abc");
        crc.update(b"def");
        assert_eq!(crc.finalize(), Crc32::compute(b"abcdef"));
    }

    #[test]
    fn writer_passes_bytes_through_and_tracks_crc() {
        let mut buf = Vec::new();
        let mut w = Crc32Writer::new(&mut buf);
        w.write_all(b"Hello, World!").unwrap();
        assert_eq!(w.crc(), 0xEC4A_C3D0);
        assert_eq!(w.bytes_written(), 13);
        assert_eq!(buf, b"Hello, World!");
    }
}
