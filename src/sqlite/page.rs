//! Table b-tree page views.
//!
//! A [`BtreePage`] wraps the raw bytes of one page together with its parsed
//! [`BtreeHeader`] and cell pointer array. It is either a [`LeafPage`], whose
//! cells carry rows, or an [`InteriorPage`], whose cells route a rowid to a
//! child page.
//!
//! Cells are not materialized up front. Each accessor decodes just the part
//! of the cell it needs straight from the page bytes:
//!
//! ```text
//! leaf cell:      | payload size (varint) | rowid (varint) | payload ... | [overflow page u32]
//! interior cell:  | left child page (u32 BE) | rowid (varint) |
//! ```
//!
//! A page view borrows the page slice it was built from and cannot outlive
//! it.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::sqlite::constants::*;
use crate::sqlite::header::{btree_header_offset, BtreeHeader};
use crate::sqlite::record::Record;
use crate::sqlite::varint::{read_varint, varint_len};
use crate::SqlbError;

/// Fields shared by leaf and interior pages.
#[derive(Debug, Clone)]
struct PageView<'a> {
    header: BtreeHeader,
    offsets: Vec<u16>,
    content: &'a [u8],
    /// End of the header + cell pointer array, relative to the page start.
    pointers_end: usize,
    usable_size: usize,
}

impl<'a> PageView<'a> {
    fn cell_count(&self) -> usize {
        self.offsets.len()
    }

    /// Bytes from the start of cell `index` to the end of the usable area.
    fn cell(&self, index: usize) -> Result<&'a [u8], SqlbError> {
        let offset = *self.offsets.get(index).ok_or(SqlbError::IndexError {
            index,
            count: self.offsets.len(),
        })? as usize;

        let end = self.usable_size.min(self.content.len());
        if offset < self.pointers_end || offset >= end {
            return Err(SqlbError::Corrupt(format!(
                "Cell {} offset {} outside cell content area [{}, {})",
                index, offset, self.pointers_end, end
            )));
        }
        Ok(&self.content[offset..end])
    }
}

/// A decoded leaf cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCell<'a> {
    pub rowid: i64,
    /// Total payload size, including any bytes stored on overflow pages.
    pub payload_size: u64,
    /// The part of the payload stored on this page.
    pub local: &'a [u8],
    /// First overflow page, if the payload did not fit on this page.
    pub overflow_page: Option<u32>,
}

/// A leaf table b-tree page.
#[derive(Debug, Clone)]
pub struct LeafPage<'a> {
    view: PageView<'a>,
}

impl<'a> LeafPage<'a> {
    pub fn header(&self) -> &BtreeHeader {
        &self.view.header
    }

    pub fn cell_count(&self) -> usize {
        self.view.cell_count()
    }

    /// Cell pointer array, in key order.
    pub fn cell_offsets(&self) -> &[u16] {
        &self.view.offsets
    }

    /// Rowid of cell `index`, without touching the payload.
    pub fn rowid(&self, index: usize) -> Result<i64, SqlbError> {
        let cell = self.view.cell(index)?;
        let size_len = varint_len(cell)
            .ok_or_else(|| SqlbError::Corrupt(format!("Cell {} size varint truncated", index)))?;
        let (rowid, _) = read_varint(&cell[size_len..])?;
        Ok(rowid)
    }

    /// Decode the size, rowid, and locally stored payload of cell `index`.
    ///
    /// A payload larger than the page can hold keeps a prefix here, followed
    /// by the number of the first overflow page.
    pub fn cell(&self, index: usize) -> Result<LeafCell<'a>, SqlbError> {
        let cell = self.view.cell(index)?;
        let (payload_size, size_len) = read_varint(cell)?;
        let (rowid, rowid_len) = read_varint(&cell[size_len..])?;
        let payload_size = payload_size as u64;
        let start = size_len + rowid_len;

        let local_size = local_payload_size(payload_size, self.view.usable_size);
        let spills = (local_size as u64) < payload_size;
        let local_end = start + local_size;
        let needed = local_end + if spills { CHILD_POINTER_SIZE } else { 0 };
        if needed > cell.len() {
            return Err(SqlbError::Corrupt(format!(
                "Cell {} payload of {} bytes overruns the page",
                index, payload_size
            )));
        }

        let overflow_page = spills.then(|| BigEndian::read_u32(&cell[local_end..]));
        Ok(LeafCell {
            rowid,
            payload_size,
            local: &cell[start..local_end],
            overflow_page,
        })
    }

    /// Decode the record stored in cell `index`.
    ///
    /// Only payloads stored entirely on this page can be decoded here; use
    /// [`BTree::search`](crate::sqlite::btree::BTree::search) to follow
    /// overflow chains.
    pub fn record(&self, index: usize) -> Result<Record, SqlbError> {
        let cell = self.cell(index)?;
        if let Some(first) = cell.overflow_page {
            return Err(SqlbError::MalformedRecord(format!(
                "Payload of {} bytes continues on overflow page {}",
                cell.payload_size, first
            )));
        }
        Record::decode(cell.local)
    }
}

/// An interior table b-tree page.
#[derive(Debug, Clone)]
pub struct InteriorPage<'a> {
    view: PageView<'a>,
    right_most_child: u32,
}

impl<'a> InteriorPage<'a> {
    pub fn header(&self) -> &BtreeHeader {
        &self.view.header
    }

    pub fn cell_count(&self) -> usize {
        self.view.cell_count()
    }

    pub fn cell_offsets(&self) -> &[u16] {
        &self.view.offsets
    }

    /// Child page holding rowids greater than every separator on this page.
    pub fn right_most_child(&self) -> u32 {
        self.right_most_child
    }

    /// Left child page number of cell `index`. Every rowid in that subtree
    /// is less than or equal to [`rowid(index)`](Self::rowid).
    pub fn left_child(&self, index: usize) -> Result<u32, SqlbError> {
        let cell = self.view.cell(index)?;
        let bytes = cell.get(..CHILD_POINTER_SIZE).ok_or_else(|| {
            SqlbError::Corrupt(format!("Interior cell {} truncated", index))
        })?;
        Ok(BigEndian::read_u32(bytes))
    }

    /// Separator rowid of cell `index`.
    pub fn rowid(&self, index: usize) -> Result<i64, SqlbError> {
        let cell = self.view.cell(index)?;
        let rest = cell.get(CHILD_POINTER_SIZE..).unwrap_or(&[]);
        let (rowid, _) = read_varint(rest)?;
        Ok(rowid)
    }
}

/// A table b-tree page, dispatched on its page type.
#[derive(Debug, Clone)]
pub enum BtreePage<'a> {
    Leaf(LeafPage<'a>),
    Interior(InteriorPage<'a>),
}

impl<'a> BtreePage<'a> {
    /// Build a page view from an already parsed header, the raw cell pointer
    /// array, and the full page bytes the pointers refer into.
    ///
    /// `cell_pointers` must hold at least `2 * header.cell_count` bytes.
    pub fn construct(
        header: BtreeHeader,
        cell_pointers: &[u8],
        content: &'a [u8],
    ) -> Result<Self, SqlbError> {
        let count = header.cell_count as usize;
        let array = cell_pointers
            .get(..count * CELL_POINTER_SIZE)
            .ok_or_else(|| {
                SqlbError::MalformedHeader(format!(
                    "Cell pointer array needs {} bytes for {} cells, got {}",
                    count * CELL_POINTER_SIZE,
                    count,
                    cell_pointers.len()
                ))
            })?;
        let offsets = array
            .chunks_exact(CELL_POINTER_SIZE)
            .map(BigEndian::read_u16)
            .collect();

        let right_most_child = header.right_most_child;
        let view = PageView {
            header,
            offsets,
            content,
            pointers_end: 0,
            usable_size: content.len(),
        };
        Ok(match right_most_child {
            Some(child) => BtreePage::Interior(InteriorPage {
                view,
                right_most_child: child,
            }),
            None => BtreePage::Leaf(LeafPage { view }),
        })
    }

    /// Parse page `page_number` from its raw bytes, honoring the 100-byte
    /// file header on page 1.
    ///
    /// `usable_size` is the page size minus the reserved region; it bounds
    /// the cell content area and decides how much of a large payload is
    /// stored locally.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::page::BtreePage;
    ///
    /// // Leaf page with one cell at offset 500: payload size 2, rowid 7,
    /// // record header [2, 1] and body [42].
    /// let mut page = vec![0u8; 512];
    /// page[0] = 0x0d;
    /// page[4] = 1;
    /// page[8..10].copy_from_slice(&500u16.to_be_bytes());
    /// page[500..505].copy_from_slice(&[3, 7, 2, 1, 42]);
    ///
    /// match BtreePage::parse(2, &page, 512).unwrap() {
    ///     BtreePage::Leaf(leaf) => {
    ///         assert_eq!(leaf.rowid(0).unwrap(), 7);
    ///         assert_eq!(leaf.record(0).unwrap().to_string(), "42");
    ///     }
    ///     BtreePage::Interior(_) => unreachable!(),
    /// }
    /// ```
    pub fn parse(page_number: u32, content: &'a [u8], usable_size: u32) -> Result<Self, SqlbError> {
        let header_start = btree_header_offset(page_number);
        let header_bytes = content.get(header_start..).ok_or_else(|| {
            SqlbError::MalformedHeader(format!("Page {} too short for a b-tree header", page_number))
        })?;
        let header = BtreeHeader::parse(header_bytes)?;
        let pointers_start = header_start + header.size();
        let pointers_end = pointers_start + header.cell_count as usize * CELL_POINTER_SIZE;
        let cell_pointers = content.get(pointers_start..pointers_end).ok_or_else(|| {
            SqlbError::MalformedHeader(format!(
                "Page {}: {} cell pointers overrun the page",
                page_number, header.cell_count
            ))
        })?;

        let mut page = Self::construct(header, cell_pointers, content)?;
        let view = page.view_mut();
        view.pointers_end = pointers_end;
        view.usable_size = (usable_size as usize).min(content.len());
        Ok(page)
    }

    fn view_mut(&mut self) -> &mut PageView<'a> {
        match self {
            BtreePage::Leaf(p) => &mut p.view,
            BtreePage::Interior(p) => &mut p.view,
        }
    }

    fn view(&self) -> &PageView<'a> {
        match self {
            BtreePage::Leaf(p) => &p.view,
            BtreePage::Interior(p) => &p.view,
        }
    }

    pub fn header(&self) -> &BtreeHeader {
        &self.view().header
    }

    pub fn cell_count(&self) -> usize {
        self.view().cell_count()
    }

    /// Separator or row key of cell `index`.
    pub fn rowid(&self, index: usize) -> Result<i64, SqlbError> {
        match self {
            BtreePage::Leaf(p) => p.rowid(index),
            BtreePage::Interior(p) => p.rowid(index),
        }
    }

    /// Summaries of every cell, for display.
    pub fn cell_summaries(&self) -> Result<Vec<CellSummary>, SqlbError> {
        (0..self.cell_count())
            .map(|i| -> Result<CellSummary, SqlbError> {
                let offset = self.view().offsets[i];
                Ok(match self {
                    BtreePage::Leaf(p) => {
                        let cell = p.cell(i)?;
                        CellSummary {
                            index: i,
                            offset,
                            rowid: cell.rowid,
                            left_child: None,
                            payload_size: Some(cell.payload_size),
                            overflow_page: cell.overflow_page,
                        }
                    }
                    BtreePage::Interior(p) => CellSummary {
                        index: i,
                        offset,
                        rowid: p.rowid(i)?,
                        left_child: Some(p.left_child(i)?),
                        payload_size: None,
                        overflow_page: None,
                    },
                })
            })
            .collect()
    }
}

/// One cell of a page, as reported by `sqlb pages`.
#[derive(Debug, Clone, Serialize)]
pub struct CellSummary {
    pub index: usize,
    pub offset: u16,
    pub rowid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_child: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_page: Option<u32>,
}

/// Number of payload bytes a table leaf cell keeps on its own page.
///
/// Payloads up to `usable - 35` bytes are stored whole. Larger payloads keep
/// between `min_local` and `max_local` bytes locally and continue on
/// overflow pages.
pub fn local_payload_size(payload_size: u64, usable_size: usize) -> usize {
    let usable = usable_size as u64;
    let max_local = usable.saturating_sub(35);
    if payload_size <= max_local {
        return payload_size as usize;
    }
    let min_local = ((usable.saturating_sub(12)) * 32 / 255).saturating_sub(23);
    let per_overflow = usable.saturating_sub(OVERFLOW_NEXT_SIZE as u64).max(1);
    let surplus = min_local + (payload_size - min_local) % per_overflow;
    if surplus <= max_local {
        surplus as usize
    } else {
        min_local as usize
    }
}
