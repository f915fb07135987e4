//! Synthetic SQLite database images shared by the integration tests.
//!
//! `build_database` lays out a file as:
//!
//! ```text
//! page 1        file header + empty leaf table (schema root)
//! page 2        interior table root
//! pages 3..     leaf table pages, `rows_per_leaf` rows each
//! pages after   overflow chains for payloads too large for a leaf
//! ```
#![allow(dead_code)]

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};
use tempfile::NamedTempFile;

use sqlb::sqlite::page::local_payload_size;

pub const PAGE_SIZE: usize = 1024;
pub const ROOT_PAGE: u32 = 2;

pub enum Col {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

pub fn encode_varint(mut v: u64) -> Vec<u8> {
    if v >> 56 != 0 {
        let mut out = vec![0u8; 9];
        out[8] = v as u8;
        v >>= 8;
        for b in out[..8].iter_mut().rev() {
            *b = (v as u8 & 0x7f) | 0x80;
            v >>= 7;
        }
        return out;
    }
    let mut out = Vec::new();
    loop {
        out.push((v & 0x7f) as u8);
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    out.reverse();
    let last = out.len() - 1;
    for b in &mut out[..last] {
        *b |= 0x80;
    }
    out
}

/// Encode a record: header of serial types followed by the body.
pub fn encode_record(cols: &[Col]) -> Vec<u8> {
    let mut types = Vec::new();
    let mut body = Vec::new();
    for col in cols {
        let serial: u64 = match col {
            Col::Null => 0,
            Col::Int(0) => 8,
            Col::Int(1) => 9,
            Col::Int(v) if i8::try_from(*v).is_ok() => {
                body.push(*v as i8 as u8);
                1
            }
            Col::Int(v) if i16::try_from(*v).is_ok() => {
                body.extend_from_slice(&(*v as i16).to_be_bytes());
                2
            }
            Col::Int(v) => {
                body.extend_from_slice(&v.to_be_bytes());
                6
            }
            Col::Real(v) => {
                body.extend_from_slice(&v.to_be_bytes());
                7
            }
            Col::Text(s) => {
                body.extend_from_slice(s.as_bytes());
                13 + 2 * s.len() as u64
            }
            Col::Blob(b) => {
                body.extend_from_slice(b);
                12 + 2 * b.len() as u64
            }
        };
        types.extend(encode_varint(serial));
    }
    let mut header_size = types.len() + 1;
    if encode_varint(header_size as u64).len() > 1 {
        header_size += 1;
    }
    let mut out = encode_varint(header_size as u64);
    out.extend(types);
    out.extend(body);
    out
}

/// The record stored for rowid `id` by [`sample_rows`].
pub fn sample_record(id: i64) -> Vec<u8> {
    encode_record(&[Col::Int(id), Col::Text(format!("row-{}", id))])
}

/// Rowids `1..=count` with [`sample_record`] payloads.
pub fn sample_rows(count: i64) -> Vec<(i64, Vec<u8>)> {
    (1..=count).map(|id| (id, sample_record(id))).collect()
}

/// Blob payload whose bytes cycle through 0..=250.
pub fn pattern_blob(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn write_file_header(page: &mut [u8], total_pages: u32) {
    page[..16].copy_from_slice(b"SQLite format 3\0");
    BigEndian::write_u16(&mut page[16..], PAGE_SIZE as u16);
    page[18] = 1;
    page[19] = 1;
    page[21] = 64;
    page[22] = 32;
    page[23] = 32;
    BigEndian::write_u32(&mut page[24..], 7);
    BigEndian::write_u32(&mut page[28..], total_pages);
    BigEndian::write_u32(&mut page[40..], 1);
    BigEndian::write_u32(&mut page[44..], 4);
    BigEndian::write_u32(&mut page[56..], 1);
    BigEndian::write_u32(&mut page[92..], 7);
    BigEndian::write_u32(&mut page[96..], 3_045_001);
}

/// Write a b-tree page header plus cells packed from the end of the page.
fn write_btree_page(page: &mut [u8], header_at: usize, right_most: Option<u32>, cells: &[Vec<u8>]) {
    let header_size = if right_most.is_some() { 12 } else { 8 };
    page[header_at] = if right_most.is_some() { 0x05 } else { 0x0d };
    BigEndian::write_u16(&mut page[header_at + 3..], cells.len() as u16);
    if let Some(child) = right_most {
        BigEndian::write_u32(&mut page[header_at + 8..], child);
    }
    let mut end = page.len();
    let pointers = header_at + header_size;
    for (i, cell) in cells.iter().enumerate() {
        let start = end - cell.len();
        assert!(start >= pointers + 2 * cells.len(), "page overflowed in test builder");
        page[start..end].copy_from_slice(cell);
        BigEndian::write_u16(&mut page[pointers + 2 * i..], start as u16);
        end = start;
    }
    BigEndian::write_u16(&mut page[header_at + 5..], end as u16);
}

/// Build a database image holding `rows` (ascending rowids) in a two-level
/// table b-tree rooted at [`ROOT_PAGE`].
pub fn build_database(rows: &[(i64, Vec<u8>)], rows_per_leaf: usize) -> Vec<u8> {
    let usable = PAGE_SIZE;
    let per_overflow = usable - 4;
    let leaves: Vec<&[(i64, Vec<u8>)]> = rows.chunks(rows_per_leaf.max(1)).collect();
    let first_leaf = ROOT_PAGE as usize + 1;
    let mut next_overflow = (first_leaf + leaves.len()) as u32;

    let mut leaf_pages = Vec::new();
    let mut overflow_pages: Vec<Vec<u8>> = Vec::new();
    let mut separators = Vec::new();

    for (i, chunk) in leaves.iter().enumerate() {
        let mut cells = Vec::new();
        for (rowid, payload) in chunk.iter() {
            let mut cell = encode_varint(payload.len() as u64);
            cell.extend(encode_varint(*rowid as u64));
            let local = local_payload_size(payload.len() as u64, usable);
            cell.extend_from_slice(&payload[..local]);
            if local < payload.len() {
                cell.extend_from_slice(&next_overflow.to_be_bytes());
                let chunks: Vec<&[u8]> = payload[local..].chunks(per_overflow).collect();
                for (j, part) in chunks.iter().enumerate() {
                    let mut page = vec![0u8; PAGE_SIZE];
                    let next = if j + 1 < chunks.len() { next_overflow + 1 } else { 0 };
                    BigEndian::write_u32(&mut page, next);
                    page[4..4 + part.len()].copy_from_slice(part);
                    overflow_pages.push(page);
                    next_overflow += 1;
                }
            }
            cells.push(cell);
        }
        let mut page = vec![0u8; PAGE_SIZE];
        write_btree_page(&mut page, 0, None, &cells);
        leaf_pages.push(page);
        if i + 1 < leaves.len() {
            let mut sep = ((first_leaf + i) as u32).to_be_bytes().to_vec();
            sep.extend(encode_varint(chunk[chunk.len() - 1].0 as u64));
            separators.push(sep);
        }
    }

    let total_pages = 2 + leaf_pages.len() + overflow_pages.len();

    let mut page1 = vec![0u8; PAGE_SIZE];
    write_file_header(&mut page1, total_pages as u32);
    write_btree_page(&mut page1, 100, None, &[]);

    let mut root = vec![0u8; PAGE_SIZE];
    let right_most = (first_leaf + leaf_pages.len().saturating_sub(1)) as u32;
    write_btree_page(&mut root, 0, Some(right_most), &separators);

    let mut image = Vec::with_capacity(total_pages * PAGE_SIZE);
    image.extend(page1);
    image.extend(root);
    for page in leaf_pages.into_iter().chain(overflow_pages) {
        image.extend(page);
    }
    image
}

/// Set the type byte of 1-based page `page_number` in `image`.
pub fn set_page_type(image: &mut [u8], page_number: usize, type_byte: u8) {
    let offset = if page_number == 1 { 100 } else { 0 };
    image[(page_number - 1) * PAGE_SIZE + offset] = type_byte;
}

pub fn write_temp(image: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    tmp.write_all(image).expect("write image");
    tmp.flush().expect("flush image");
    tmp
}
