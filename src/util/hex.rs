//! Hex formatting for page dumps and blob values.

const BYTES_PER_LINE: usize = 16;

/// Format a byte offset as "decimal (0xhex)".
pub fn format_offset(offset: u64) -> String {
    format!("{} (0x{:x})", offset, offset)
}

/// Format a u32 as `0x` followed by eight hex digits.
pub fn format_hex32(value: u32) -> String {
    format!("0x{:08x}", value)
}

/// Lowercase hex digits of `data` with no separators, e.g. "4a2f00ff".
pub fn format_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hex dump of `data`, sixteen bytes per line, with offsets counted from
/// `base_offset` and a printable-ASCII column:
///
/// ```text
/// 00000064  0d 00 00 00 03 01 e4 00  01 f9 01 ee 01 e4 00 00  |................|
/// ```
pub fn hex_dump(data: &[u8], base_offset: u64) -> String {
    let mut out = String::new();
    for (i, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{:08x}  ", base_offset + (i * BYTES_PER_LINE) as u64));
        for col in 0..BYTES_PER_LINE {
            if col == BYTES_PER_LINE / 2 {
                out.push(' ');
            }
            match chunk.get(col) {
                Some(b) => out.push_str(&format!("{:02x} ", b)),
                None => out.push_str("   "),
            }
        }
        out.push_str(" |");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.extend(std::iter::repeat(' ').take(BYTES_PER_LINE - chunk.len()));
        out.push('|');
    }
    out
}
