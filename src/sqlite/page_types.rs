//! SQLite b-tree page type definitions.
//!
//! Maps the 1-byte page type flag at the start of every b-tree page header
//! to a [`PageType`]. Only the two table b-tree types are readable by this
//! crate; index b-tree pages and unknown codes are recognized so they can be
//! reported by name, but [`BtreeHeader::parse`](crate::sqlite::header::BtreeHeader::parse)
//! rejects them.

use serde::Serialize;
use std::fmt;

use crate::sqlite::constants::*;

/// B-tree page types defined by the SQLite file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageType {
    /// Interior index b-tree page (0x02)
    InteriorIndex,
    /// Interior table b-tree page (0x05)
    InteriorTable,
    /// Leaf index b-tree page (0x0a)
    LeafIndex,
    /// Leaf table b-tree page (0x0d)
    LeafTable,
    /// Any other flag value; freelist, overflow, and pointer-map pages land
    /// here when read as b-tree pages.
    Unknown(u8),
}

impl PageType {
    /// Parse a page type from the flag byte of a b-tree page header.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::page_types::PageType;
    ///
    /// assert_eq!(PageType::from_u8(0x0d), PageType::LeafTable);
    /// assert_eq!(PageType::from_u8(0x05), PageType::InteriorTable);
    /// assert_eq!(PageType::from_u8(0x0a), PageType::LeafIndex);
    /// assert_eq!(PageType::from_u8(0x42), PageType::Unknown(0x42));
    /// assert!(!PageType::from_u8(0x02).is_supported());
    /// ```
    pub fn from_u8(value: u8) -> Self {
        match value {
            PAGE_TYPE_INTERIOR_INDEX => PageType::InteriorIndex,
            PAGE_TYPE_INTERIOR_TABLE => PageType::InteriorTable,
            PAGE_TYPE_LEAF_INDEX => PageType::LeafIndex,
            PAGE_TYPE_LEAF_TABLE => PageType::LeafTable,
            other => PageType::Unknown(other),
        }
    }

    /// Returns the raw flag byte.
    pub fn as_u8(self) -> u8 {
        match self {
            PageType::InteriorIndex => PAGE_TYPE_INTERIOR_INDEX,
            PageType::InteriorTable => PAGE_TYPE_INTERIOR_TABLE,
            PageType::LeafIndex => PAGE_TYPE_LEAF_INDEX,
            PageType::LeafTable => PAGE_TYPE_LEAF_TABLE,
            PageType::Unknown(v) => v,
        }
    }

    /// Returns the short name used in CLI output.
    pub fn name(self) -> &'static str {
        match self {
            PageType::InteriorIndex => "INTERIOR_INDEX",
            PageType::InteriorTable => "INTERIOR_TABLE",
            PageType::LeafIndex => "LEAF_INDEX",
            PageType::LeafTable => "LEAF_TABLE",
            PageType::Unknown(_) => "UNKNOWN",
        }
    }

    /// Returns a human-readable description of the page type.
    pub fn description(self) -> &'static str {
        match self {
            PageType::InteriorIndex => "Interior page of an index b-tree",
            PageType::InteriorTable => "Interior page of a table b-tree (rowid routing)",
            PageType::LeafIndex => "Leaf page of an index b-tree",
            PageType::LeafTable => "Leaf page of a table b-tree (row data)",
            PageType::Unknown(_) => "Not a b-tree page",
        }
    }

    /// True for interior pages, which carry a right-most child pointer and a
    /// 12-byte header.
    pub fn is_interior(self) -> bool {
        matches!(self, PageType::InteriorIndex | PageType::InteriorTable)
    }

    /// True for the table b-tree types this crate can traverse.
    pub fn is_supported(self) -> bool {
        matches!(self, PageType::InteriorTable | PageType::LeafTable)
    }

    /// Size of the b-tree page header for this type.
    pub fn header_size(self) -> usize {
        if self.is_interior() {
            BTREE_INTERIOR_HEADER_SIZE
        } else {
            BTREE_LEAF_HEADER_SIZE
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.as_u8())
    }
}
