//! Integer codecs used by the SQLite file format.
//!
//! SQLite stores cell sizes, rowids, and record serial types as varints: a
//! big-endian base-128 encoding of 1 to 9 bytes. The first eight bytes each
//! contribute their low seven bits and use the high bit as a continuation
//! flag; a ninth byte, if reached, contributes all eight bits. Record bodies
//! additionally use 24-bit and 48-bit two's-complement integers (serial
//! types 3 and 5), decoded by [`read_twos_complement`].

use crate::sqlite::constants::MAX_VARINT_LEN;
use crate::SqlbError;

/// Decode a varint from the start of `data`.
///
/// Returns the decoded value together with the number of bytes consumed
/// (1..=9). Fails if `data` ends before the varint is terminated.
///
/// # Examples
///
/// ```
/// use sqlb::sqlite::varint::read_varint;
///
/// assert_eq!(read_varint(&[0x00]).unwrap(), (0, 1));
/// assert_eq!(read_varint(&[0x81, 0x00]).unwrap(), (128, 2));
/// assert_eq!(read_varint(&[0x81, 0x70]).unwrap(), (240, 2));
/// ```
pub fn read_varint(data: &[u8]) -> Result<(i64, usize), SqlbError> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 {
            // The ninth byte contributes all eight bits.
            value = (value << 8) | byte as u64;
            return Ok((value as i64, MAX_VARINT_LEN));
        }
        value = (value << 7) | (byte & 0x7f) as u64;
        if byte & 0x80 == 0 {
            return Ok((value as i64, i + 1));
        }
    }
    Err(SqlbError::Corrupt(format!(
        "Truncated varint ({} bytes available)",
        data.len()
    )))
}

/// Number of bytes [`read_varint`] would consume for the varint at the start
/// of `data`, or `None` if it is truncated.
pub fn varint_len(data: &[u8]) -> Option<usize> {
    data.iter()
        .take(MAX_VARINT_LEN - 1)
        .position(|b| b & 0x80 == 0)
        .map(|i| i + 1)
        .or_else(|| (data.len() >= MAX_VARINT_LEN).then_some(MAX_VARINT_LEN))
}

/// Read `width` bytes as a big-endian two's-complement signed integer.
///
/// Intended for the 24-bit and 48-bit record integers, but any width from 1
/// to 8 bytes is accepted.
///
/// # Examples
///
/// ```
/// use sqlb::sqlite::varint::read_twos_complement;
///
/// assert_eq!(read_twos_complement(&[0x00, 0x00, 0x01], 3).unwrap(), 1);
/// assert_eq!(read_twos_complement(&[0xff, 0xff, 0xff], 3).unwrap(), -1);
/// assert_eq!(read_twos_complement(&[0x80, 0x00, 0x00], 3).unwrap(), -8_388_608);
/// ```
pub fn read_twos_complement(data: &[u8], width: usize) -> Result<i64, SqlbError> {
    if !(1..=8).contains(&width) {
        return Err(SqlbError::Argument(format!(
            "Integer width must be 1..=8 bytes, got {}",
            width
        )));
    }
    let bytes = data.get(..width).ok_or_else(|| {
        SqlbError::Corrupt(format!(
            "Need {} bytes for a {}-bit integer, {} available",
            width,
            width * 8,
            data.len()
        ))
    })?;

    let raw = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
    let bits = (width * 8) as u32;
    if bits == 64 {
        return Ok(raw as i64);
    }
    // Sign-extend from the top bit of the field.
    let shift = 64 - bits;
    Ok(((raw << shift) as i64) >> shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_varints() {
        assert_eq!(read_varint(&[0x00]).unwrap(), (0, 1));
        assert_eq!(read_varint(&[0x7f]).unwrap(), (127, 1));
        // Trailing bytes are left alone
        assert_eq!(read_varint(&[0x05, 0xff, 0xff]).unwrap(), (5, 1));
    }

    #[test]
    fn test_multi_byte_varints() {
        assert_eq!(read_varint(&[0x81, 0x00]).unwrap(), (128, 2));
        // Stops at the first byte with the high bit clear
        assert_eq!(read_varint(&[0x81, 0x01, 0x01]).unwrap(), (129, 2));
        assert_eq!(read_varint(&[0x81, 0x70]).unwrap(), (240, 2));
        assert_eq!(read_varint(&[0xff, 0x7f]).unwrap(), (16383, 2));
    }

    #[test]
    fn test_nine_byte_varint_uses_full_last_byte() {
        let data = [0x81, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xff, 0x00];
        let (value, used) = read_varint(&data).unwrap();
        assert_eq!(used, 9);
        // Leading byte lands at bit 57, ninth byte fills the low eight bits
        assert_eq!(value as u64, (1u64 << 57) | 0xff);

        let all_ones = [0xff; 9];
        assert_eq!(read_varint(&all_ones).unwrap(), (-1, 9));
    }

    #[test]
    fn test_truncated_varint() {
        assert!(read_varint(&[]).is_err());
        assert!(read_varint(&[0x81]).is_err());
        assert!(read_varint(&[0xff; 8]).is_err());
    }

    #[test]
    fn test_varint_len() {
        assert_eq!(varint_len(&[0x00]), Some(1));
        assert_eq!(varint_len(&[0x81, 0x01, 0x01]), Some(2));
        assert_eq!(varint_len(&[0xff; 9]), Some(9));
        assert_eq!(varint_len(&[0xff; 4]), None);
    }

    #[test]
    fn test_twos_complement_24() {
        assert_eq!(read_twos_complement(&[0x00, 0x00, 0x01], 3).unwrap(), 1);
        assert_eq!(read_twos_complement(&[0xff, 0xff, 0xff], 3).unwrap(), -1);
        assert_eq!(read_twos_complement(&[0x80, 0x00, 0x00], 3).unwrap(), -8_388_608);
        assert_eq!(read_twos_complement(&[0x7f, 0xff, 0xff], 3).unwrap(), 8_388_607);
    }

    #[test]
    fn test_twos_complement_48() {
        let one = [0, 0, 0, 0, 0, 1];
        let minus_one = [0xff; 6];
        let min = [0x80, 0, 0, 0, 0, 0];
        let max = [0x7f, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(read_twos_complement(&one, 6).unwrap(), 1);
        assert_eq!(read_twos_complement(&minus_one, 6).unwrap(), -1);
        assert_eq!(read_twos_complement(&min, 6).unwrap(), -(1i64 << 47));
        assert_eq!(read_twos_complement(&max, 6).unwrap(), (1i64 << 47) - 1);
    }

    #[test]
    fn test_twos_complement_bad_input() {
        assert!(read_twos_complement(&[0x01, 0x02], 3).is_err());
        assert!(read_twos_complement(&[0x01], 0).is_err());
        assert!(read_twos_complement(&[0u8; 9], 9).is_err());
    }
}
