/// SQLite file and b-tree page structure constants.
///
/// Offsets follow the "Database File Format" document
/// (https://www.sqlite.org/fileformat2.html).
// File header (100 bytes, start of page 1)
pub const FILE_HEADER_SIZE: usize = 100;
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
pub const HDR_MAGIC: usize = 0; // 16 bytes - "SQLite format 3\0"
pub const HDR_PAGE_SIZE: usize = 16; // 2 bytes - page size (1 means 65536)
pub const HDR_WRITE_VERSION: usize = 18; // 1 byte - 1 legacy, 2 WAL
pub const HDR_READ_VERSION: usize = 19; // 1 byte - 1 legacy, 2 WAL
pub const HDR_RESERVED_SPACE: usize = 20; // 1 byte - unused bytes at end of each page
pub const HDR_CHANGE_COUNTER: usize = 24; // 4 bytes - file change counter
pub const HDR_DATABASE_SIZE: usize = 28; // 4 bytes - size of the database in pages
pub const HDR_FREELIST_TRUNK: usize = 32; // 4 bytes - first freelist trunk page
pub const HDR_FREELIST_COUNT: usize = 36; // 4 bytes - total freelist pages
pub const HDR_SCHEMA_COOKIE: usize = 40; // 4 bytes - schema cookie
pub const HDR_SCHEMA_FORMAT: usize = 44; // 4 bytes - schema format number (1-4)
pub const HDR_TEXT_ENCODING: usize = 56; // 4 bytes - 1 UTF-8, 2 UTF-16le, 3 UTF-16be
pub const HDR_USER_VERSION: usize = 60; // 4 bytes - user version
pub const HDR_APPLICATION_ID: usize = 68; // 4 bytes - application id
pub const HDR_VERSION_NUMBER: usize = 96; // 4 bytes - SQLITE_VERSION_NUMBER

// Page sizes
pub const MIN_PAGE_SIZE: u32 = 512;
pub const MAX_PAGE_SIZE: u32 = 65536;

// B-tree page header (8 bytes on leaf pages, 12 on interior pages)
pub const BTREE_LEAF_HEADER_SIZE: usize = 8;
pub const BTREE_INTERIOR_HEADER_SIZE: usize = 12;
pub const BTREE_PAGE_TYPE: usize = 0; // 1 byte - page type flag
pub const BTREE_FIRST_FREEBLOCK: usize = 1; // 2 bytes - first freeblock (0 if none)
pub const BTREE_CELL_COUNT: usize = 3; // 2 bytes - number of cells
pub const BTREE_CONTENT_START: usize = 5; // 2 bytes - start of cell content area (0 means 65536)
pub const BTREE_FRAGMENTED_BYTES: usize = 7; // 1 byte - fragmented free bytes
pub const BTREE_RIGHT_MOST_CHILD: usize = 8; // 4 bytes - right-most pointer (interior only)

// Page type codes
pub const PAGE_TYPE_INTERIOR_INDEX: u8 = 0x02;
pub const PAGE_TYPE_INTERIOR_TABLE: u8 = 0x05;
pub const PAGE_TYPE_LEAF_INDEX: u8 = 0x0a;
pub const PAGE_TYPE_LEAF_TABLE: u8 = 0x0d;

// Cells
pub const CELL_POINTER_SIZE: usize = 2;
pub const CHILD_POINTER_SIZE: usize = 4;
pub const MAX_VARINT_LEN: usize = 9;

// Overflow pages: 4-byte next pointer followed by content
pub const OVERFLOW_NEXT_SIZE: usize = 4;

/// Depth limit for a single descent. SQLite itself refuses b-trees deeper
/// than 20 levels (BTCURSOR_MAX_DEPTH).
pub const MAX_BTREE_DEPTH: u64 = 20;
