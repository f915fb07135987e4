//! File header and b-tree page header parsing.
//!
//! The first 100 bytes of a SQLite database hold the file header
//! ([`FileHeader`]). Only the page size is needed to locate pages; the other
//! fields are decoded for display by `sqlb info`.
//!
//! Every b-tree page starts with an 8-byte (leaf) or 12-byte (interior)
//! header ([`BtreeHeader`]), followed immediately by the cell pointer array.
//! Page 1 is the exception: its b-tree header starts after the file header,
//! at byte 100. See [`btree_header_offset`].

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::sqlite::constants::*;
use crate::sqlite::page_types::PageType;
use crate::SqlbError;

/// Parsed 100-byte database file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    /// Page size in bytes (the on-disk value 1 is expanded to 65536).
    pub page_size: u32,
    /// File format write version (1 = legacy, 2 = WAL).
    pub write_version: u8,
    /// File format read version (1 = legacy, 2 = WAL).
    pub read_version: u8,
    /// Bytes of unused space at the end of every page.
    pub reserved_space: u8,
    /// File change counter.
    pub change_counter: u32,
    /// Size of the database in pages, as recorded in the header.
    pub database_size: u32,
    /// Page number of the first freelist trunk page (0 if none).
    pub freelist_trunk: u32,
    /// Total number of freelist pages.
    pub freelist_count: u32,
    pub schema_cookie: u32,
    pub schema_format: u32,
    /// Text encoding (1 = UTF-8, 2 = UTF-16le, 3 = UTF-16be).
    pub text_encoding: u32,
    pub user_version: u32,
    pub application_id: u32,
    /// SQLITE_VERSION_NUMBER of the library that last wrote the file.
    pub version_number: u32,
}

impl FileHeader {
    /// Parse the file header from the first 100 bytes of a database.
    ///
    /// Fails with [`SqlbError::MalformedHeader`] if fewer than 100 bytes are
    /// supplied, the magic string is missing, or the page size is not a
    /// power of two between 512 and 65536.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::header::FileHeader;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut data = vec![0u8; 100];
    /// data[..16].copy_from_slice(b"SQLite format 3\0");
    /// BigEndian::write_u16(&mut data[16..], 4096);
    ///
    /// let hdr = FileHeader::parse(&data).unwrap();
    /// assert_eq!(hdr.page_size, 4096);
    /// assert_eq!(hdr.usable_size(), 4096);
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self, SqlbError> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(SqlbError::MalformedHeader(format!(
                "File header needs {} bytes, got {}",
                FILE_HEADER_SIZE,
                data.len()
            )));
        }
        if &data[HDR_MAGIC..HDR_MAGIC + SQLITE_MAGIC.len()] != SQLITE_MAGIC {
            return Err(SqlbError::MalformedHeader(
                "Missing \"SQLite format 3\" magic string".to_string(),
            ));
        }

        let page_size = match BigEndian::read_u16(&data[HDR_PAGE_SIZE..]) {
            1 => MAX_PAGE_SIZE,
            n => n as u32,
        };
        validate_page_size(page_size)?;

        let reserved_space = data[HDR_RESERVED_SPACE];
        if page_size - (reserved_space as u32) < 480 {
            return Err(SqlbError::MalformedHeader(format!(
                "Reserved space {} leaves fewer than 480 usable bytes in a {}-byte page",
                reserved_space, page_size
            )));
        }

        Ok(FileHeader {
            page_size,
            write_version: data[HDR_WRITE_VERSION],
            read_version: data[HDR_READ_VERSION],
            reserved_space,
            change_counter: BigEndian::read_u32(&data[HDR_CHANGE_COUNTER..]),
            database_size: BigEndian::read_u32(&data[HDR_DATABASE_SIZE..]),
            freelist_trunk: BigEndian::read_u32(&data[HDR_FREELIST_TRUNK..]),
            freelist_count: BigEndian::read_u32(&data[HDR_FREELIST_COUNT..]),
            schema_cookie: BigEndian::read_u32(&data[HDR_SCHEMA_COOKIE..]),
            schema_format: BigEndian::read_u32(&data[HDR_SCHEMA_FORMAT..]),
            text_encoding: BigEndian::read_u32(&data[HDR_TEXT_ENCODING..]),
            user_version: BigEndian::read_u32(&data[HDR_USER_VERSION..]),
            application_id: BigEndian::read_u32(&data[HDR_APPLICATION_ID..]),
            version_number: BigEndian::read_u32(&data[HDR_VERSION_NUMBER..]),
        })
    }

    /// Bytes per page available to the b-tree layer (page size minus the
    /// reserved region).
    pub fn usable_size(&self) -> u32 {
        self.page_size - self.reserved_space as u32
    }

    /// Human-readable name of the text encoding.
    pub fn text_encoding_name(&self) -> &'static str {
        match self.text_encoding {
            0 | 1 => "UTF-8",
            2 => "UTF-16le",
            3 => "UTF-16be",
            _ => "Unknown",
        }
    }
}

/// Check that `page_size` is a power of two between 512 and 65536.
pub fn validate_page_size(page_size: u32) -> Result<(), SqlbError> {
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) || !page_size.is_power_of_two() {
        return Err(SqlbError::MalformedHeader(format!(
            "Invalid page size {}",
            page_size
        )));
    }
    Ok(())
}

/// Parsed b-tree page header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BtreeHeader {
    /// Page type flag. Byte 0.
    pub page_type: PageType,
    /// Offset of the first freeblock, 0 if none. Bytes 1-2.
    pub first_freeblock: u16,
    /// Number of cells on the page. Bytes 3-4.
    pub cell_count: u16,
    /// Start of the cell content area (0 on disk means 65536). Bytes 5-6.
    pub content_start: u32,
    /// Fragmented free bytes within the cell content area. Byte 7.
    pub fragmented_bytes: u8,
    /// Right-most child page number. Bytes 8-11, interior pages only.
    pub right_most_child: Option<u32>,
}

impl BtreeHeader {
    /// Parse a b-tree page header from `data`, which must start at the
    /// header (byte 100 on page 1, byte 0 elsewhere).
    ///
    /// Leaf headers need 8 bytes, interior headers 12. Index b-tree and
    /// unknown page types fail with [`SqlbError::UnsupportedPageType`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::header::BtreeHeader;
    /// use sqlb::sqlite::page_types::PageType;
    ///
    /// let data = [0x05, 0, 0, 0, 3, 0x0f, 0xa0, 0, 0, 0, 0, 7];
    /// let hdr = BtreeHeader::parse(&data).unwrap();
    /// assert_eq!(hdr.page_type, PageType::InteriorTable);
    /// assert_eq!(hdr.cell_count, 3);
    /// assert_eq!(hdr.right_most_child, Some(7));
    ///
    /// assert!(BtreeHeader::parse(&[0x0a, 0, 0, 0, 0, 0, 0, 0]).is_err());
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self, SqlbError> {
        let type_byte = *data.first().ok_or_else(|| {
            SqlbError::MalformedHeader("Empty b-tree page header".to_string())
        })?;
        let page_type = PageType::from_u8(type_byte);
        if !page_type.is_supported() {
            return Err(SqlbError::UnsupportedPageType(type_byte));
        }

        let needed = page_type.header_size();
        if data.len() < needed {
            return Err(SqlbError::MalformedHeader(format!(
                "{} header needs {} bytes, got {}",
                page_type.name(),
                needed,
                data.len()
            )));
        }

        let content_start = match BigEndian::read_u16(&data[BTREE_CONTENT_START..]) {
            0 => MAX_PAGE_SIZE,
            n => n as u32,
        };
        let right_most_child = page_type
            .is_interior()
            .then(|| BigEndian::read_u32(&data[BTREE_RIGHT_MOST_CHILD..]));

        Ok(BtreeHeader {
            page_type,
            first_freeblock: BigEndian::read_u16(&data[BTREE_FIRST_FREEBLOCK..]),
            cell_count: BigEndian::read_u16(&data[BTREE_CELL_COUNT..]),
            content_start,
            fragmented_bytes: data[BTREE_FRAGMENTED_BYTES],
            right_most_child,
        })
    }

    /// True if this is a leaf table page.
    pub fn is_leaf(&self) -> bool {
        !self.page_type.is_interior()
    }

    /// Size of this header on disk (8 or 12 bytes).
    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }
}

/// Byte offset of the b-tree header within a page: 100 on page 1 (after the
/// file header), 0 on every other page.
pub fn btree_header_offset(page_number: u32) -> usize {
    if page_number == 1 {
        FILE_HEADER_SIZE
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_header_bytes(page_size: u16) -> Vec<u8> {
        let mut data = vec![0u8; FILE_HEADER_SIZE];
        data[..16].copy_from_slice(SQLITE_MAGIC);
        BigEndian::write_u16(&mut data[HDR_PAGE_SIZE..], page_size);
        data
    }

    #[test]
    fn test_file_header_fields() {
        let mut data = file_header_bytes(4096);
        data[HDR_WRITE_VERSION] = 1;
        data[HDR_READ_VERSION] = 1;
        data[HDR_RESERVED_SPACE] = 16;
        BigEndian::write_u32(&mut data[HDR_DATABASE_SIZE..], 12);
        BigEndian::write_u32(&mut data[HDR_TEXT_ENCODING..], 1);
        BigEndian::write_u32(&mut data[HDR_VERSION_NUMBER..], 3_045_001);

        let hdr = FileHeader::parse(&data).unwrap();
        assert_eq!(hdr.page_size, 4096);
        assert_eq!(hdr.usable_size(), 4080);
        assert_eq!(hdr.database_size, 12);
        assert_eq!(hdr.text_encoding_name(), "UTF-8");
        assert_eq!(hdr.version_number, 3_045_001);
    }

    #[test]
    fn test_page_size_one_means_64k() {
        let hdr = FileHeader::parse(&file_header_bytes(1)).unwrap();
        assert_eq!(hdr.page_size, 65536);
    }

    #[test]
    fn test_file_header_rejects_short_input() {
        let data = file_header_bytes(4096);
        assert!(matches!(
            FileHeader::parse(&data[..99]),
            Err(SqlbError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_file_header_rejects_bad_magic_and_page_size() {
        let mut data = file_header_bytes(4096);
        data[0] = b'X';
        assert!(matches!(FileHeader::parse(&data), Err(SqlbError::MalformedHeader(_))));

        for bad in [0u16, 256, 1000, 4097] {
            assert!(matches!(
                FileHeader::parse(&file_header_bytes(bad)),
                Err(SqlbError::MalformedHeader(_))
            ));
        }
    }

    #[test]
    fn test_leaf_header_without_right_pointer() {
        let data = [0x0d, 0, 0, 0, 2, 0x0f, 0x00, 0];
        let hdr = BtreeHeader::parse(&data).unwrap();
        assert!(hdr.is_leaf());
        assert_eq!(hdr.cell_count, 2);
        assert_eq!(hdr.content_start, 0x0f00);
        assert_eq!(hdr.right_most_child, None);
        assert_eq!(hdr.size(), 8);
    }

    #[test]
    fn test_interior_header_needs_twelve_bytes() {
        let data = [0x05, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 9];
        assert!(matches!(
            BtreeHeader::parse(&data[..8]),
            Err(SqlbError::MalformedHeader(_))
        ));
        let hdr = BtreeHeader::parse(&data).unwrap();
        assert_eq!(hdr.content_start, 65536);
        assert_eq!(hdr.right_most_child, Some(9));
    }

    #[test]
    fn test_index_pages_are_rejected() {
        for code in [0x02u8, 0x0a, 0x00, 0x0e] {
            let data = [code, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
            assert!(matches!(
                BtreeHeader::parse(&data),
                Err(SqlbError::UnsupportedPageType(c)) if c == code
            ));
        }
    }

    #[test]
    fn test_btree_header_offset() {
        assert_eq!(btree_header_offset(1), 100);
        assert_eq!(btree_header_offset(2), 0);
    }
}
