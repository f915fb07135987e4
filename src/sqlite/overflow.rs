//! Overflow page chains.
//!
//! When a row's payload is too large for its leaf page, the leaf keeps a
//! prefix and the remainder is stored on a singly linked chain of overflow
//! pages. Each overflow page starts with the 4-byte number of the next page
//! in the chain (0 on the last page), followed by `usable_size - 4` bytes of
//! payload.

use std::borrow::Cow;
use std::collections::HashSet;

use byteorder::{BigEndian, ByteOrder};

use crate::sqlite::constants::OVERFLOW_NEXT_SIZE;
use crate::sqlite::page::LeafCell;
use crate::sqlite::pager::Pager;
use crate::SqlbError;

/// Return the complete payload of `cell`, following its overflow chain if it
/// has one.
///
/// Payloads stored entirely on the leaf page are borrowed without copying.
/// A chain that ends early, revisits a page, or claims more bytes than the
/// file could hold fails with [`SqlbError::Corrupt`].
pub fn read_payload<'a>(pager: &'a Pager, cell: &LeafCell<'a>) -> Result<Cow<'a, [u8]>, SqlbError> {
    let Some(first) = cell.overflow_page else {
        return Ok(Cow::Borrowed(cell.local));
    };

    let per_page = (pager.usable_size() as usize).saturating_sub(OVERFLOW_NEXT_SIZE);
    // Page 1 always holds the schema root, never overflow content.
    let overflow_pages = pager.page_count().saturating_sub(1);
    let capacity = cell.local.len() as u64 + overflow_pages * per_page as u64;
    if per_page == 0 || cell.payload_size > capacity {
        return Err(SqlbError::Corrupt(format!(
            "Payload of {} bytes for rowid {} cannot fit in a {}-page file",
            cell.payload_size,
            cell.rowid,
            pager.page_count()
        )));
    }

    let total = cell.payload_size as usize;
    let mut payload = Vec::with_capacity(total);
    payload.extend_from_slice(cell.local);

    let mut next = first;
    let mut visited = HashSet::new();
    while payload.len() < total {
        if next == 0 {
            return Err(SqlbError::Corrupt(format!(
                "Overflow chain for rowid {} ends after {} of {} bytes",
                cell.rowid,
                payload.len(),
                total
            )));
        }
        if !visited.insert(next) {
            return Err(SqlbError::Corrupt(format!(
                "Overflow chain for rowid {} revisits page {}",
                cell.rowid, next
            )));
        }

        let page = pager.page(next)?;
        let take = per_page.min(total - payload.len());
        payload.extend_from_slice(&page[OVERFLOW_NEXT_SIZE..OVERFLOW_NEXT_SIZE + take]);
        next = BigEndian::read_u32(page);
    }

    Ok(Cow::Owned(payload))
}
