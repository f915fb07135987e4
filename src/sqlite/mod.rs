//! SQLite on-disk format parsing.
//!
//! Everything needed to resolve a rowid against a table b-tree in a SQLite
//! database file: the 100-byte file header, b-tree page headers and cell
//! pointer arrays, varint and record decoding, overflow chains, and the
//! root-to-leaf descent itself.
//!
//! Start with [`pager::Pager`] to open a database, then hand it to
//! [`btree::BTree`] together with a root page number.

pub mod btree;
pub mod constants;
pub mod header;
pub mod overflow;
pub mod page;
pub mod page_types;
pub mod pager;
pub mod pool;
pub mod record;
pub mod varint;
