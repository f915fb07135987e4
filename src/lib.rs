//! Read-only SQLite table b-tree toolkit.
//!
//! The `sqlite-btree-utils` crate (library name `sqlb`) maps a SQLite
//! database file into memory and resolves rowid lookups against table
//! b-trees: it decodes the file header, walks interior pages down to the
//! leaf that holds a rowid, and decodes the matching cell into typed column
//! values. Nothing is ever written back to the file.
//!
//! # CLI Reference
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`sqlb search`](cli::app::Commands::Search) | Look up rowids read from stdin under a root page |
//! | [`sqlb info`](cli::app::Commands::Info) | Decode the 100-byte database file header |
//! | [`sqlb pages`](cli::app::Commands::Pages) | Show b-tree page headers and cell summaries |
//! | [`sqlb dump`](cli::app::Commands::Dump) | Hex dump of raw page bytes |
//! | [`sqlb completions`](cli::app::Commands::Completions) | Generate shell completions |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>`
//! and `-v` (repeatable) to raise the log level on stderr.
//!
//! # Library API
//!
//! ```no_run
//! use sqlb::sqlite::btree::BTree;
//! use sqlb::sqlite::pager::Pager;
//!
//! let pager = Pager::open("app.db").unwrap();
//! let tree = BTree::new(&pager, 2);
//! match tree.search(42).unwrap() {
//!     Some(record) => println!("{}", record),
//!     None => println!("rowid 42 not present"),
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`sqlite::pager`] | Read-only memory-mapped page access, 1-based page numbers |
//! | [`sqlite::pool`] | Reusable page buffers for callers that need owned copies |
//! | [`sqlite::varint`] | Varint and two's-complement integer codecs |
//! | [`sqlite::header`] | File header and b-tree page header parsing |
//! | [`sqlite::page_types`] | B-tree page type codes |
//! | [`sqlite::page`] | Leaf / interior page views and cell accessors |
//! | [`sqlite::overflow`] | Reassembly of payloads spilled to overflow pages |
//! | [`sqlite::record`] | Record format decoding into typed values |
//! | [`sqlite::btree`] | Rowid descent from a root page to a leaf |
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | on | Builds the `sqlb` binary and the [`cli`] module. |

#[cfg(feature = "cli")]
pub mod cli;
pub mod sqlite;
pub mod util;

use thiserror::Error;

/// Errors returned by `sqlb` operations.
#[derive(Error, Debug)]
pub enum SqlbError {
    /// An I/O error occurred (file open, stat, mmap, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A page number outside the mapped file was requested.
    #[error("Page {page} out of range (file has {page_count} pages)")]
    OutOfRange { page: u64, page_count: u64 },

    /// The file header or a b-tree page header is truncated or invalid.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The page is an index b-tree page or carries an unknown type code.
    #[error("Unsupported page type: 0x{0:02x}")]
    UnsupportedPageType(u8),

    /// A record header uses one of the reserved serial types (10, 11).
    #[error("Unsupported serial type: {0}")]
    UnsupportedSerialType(u64),

    /// A cell index outside `0..cell_count` was requested.
    #[error("Cell index {index} out of bounds (page has {count} cells)")]
    IndexError { index: usize, count: usize },

    /// A record payload is inconsistent with its own header.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Structural damage: bad cell offsets, truncated cells, or a descent
    /// that exceeds the depth limit.
    #[error("Corrupt database: {0}")]
    Corrupt(String),

    /// An invalid argument was supplied on the command line.
    #[error("Invalid argument: {0}")]
    Argument(String),
}
