//! 7z's variable-length integer and auxiliary header encodings: numbers,
//! UTF-16LE strings, and MSB-first packed boolean vectors.
//!
//! Adapted from the teacher's `write/encoding_utils.rs`; the number
//! encoding itself follows the 7z format directly (the teacher's reader
//! implements the decode side in `format/reader.rs`, not carried into
//! this encode-only crate).

/// Writes `value` in 7z's variable-length form: the leading byte's
/// high-order 1-bits count how many little-endian continuation bytes
/// follow, and any remaining low bits of that leading byte hold the
/// value's highest bits.
pub fn write_number(out: &mut Vec<u8>, value: u64) {
    let mut first_byte = 0u8;
    let mut mask = 0x80u8;
    let v = value;

    for i in 0..8 {
        if v < (1u64 << (7 * (i + 1))) {
            first_byte |= (v >> (8 * i)) as u8;
            out.push(first_byte);
            for j in 0..i {
                out.push((v >> (8 * j)) as u8);
            }
            return;
        }
        first_byte |= mask;
        mask >>= 1;
    }
    out.push(first_byte);
    out.extend_from_slice(&v.to_le_bytes());
}

/// Writes `s` as a null-terminated UTF-16LE string.
pub fn write_utf16le_string(out: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
}

/// Packs `bits` MSB-first, 8 per byte, zero-padding the final byte.
pub fn pack_bool_vector(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            bytes[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers_fit_in_one_byte() {
        let mut out = Vec::new();
        write_number(&mut out, 5);
        assert_eq!(out, vec![5]);
    }

    #[test]
    fn a_127_boundary_value_still_fits_in_one_byte() {
        let mut out = Vec::new();
        write_number(&mut out, 0x7F);
        assert_eq!(out, vec![0x7F]);
    }

    #[test]
    fn a_value_past_the_one_byte_boundary_uses_a_continuation_byte() {
        let mut out = Vec::new();
        write_number(&mut out, 0x80);
        assert_eq!(out[0] & 0x80, 0x80);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn a_large_value_round_trips_through_the_leading_bit_count() {
        let mut out = Vec::new();
        write_number(&mut out, u64::MAX);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn utf16_string_is_null_terminated() {
        let mut out = Vec::new();
        write_utf16le_string(&mut out, "ab");
        assert_eq!(out, vec![b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn bool_vector_is_msb_first_and_zero_padded() {
        assert_eq!(pack_bool_vector(&[true, false, true]), vec![0b1010_0000]);
        assert_eq!(pack_bool_vector(&[true; 8]), vec![0xFF]);
    }
}
