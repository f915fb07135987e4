//! CLI subcommand implementations for the `sqlb` binary.
//!
//! Argument parsing uses clap derive macros. The top-level [`app::Cli`]
//! struct and [`app::Commands`] enum live in [`app`] and are shared between
//! `main.rs` and `build.rs` (for man pages and completion scripts) via
//! `include!()`.
//!
//! Each subcommand module exposes an `Options` struct holding the parsed
//! arguments and an `execute(opts, writer)` entry point. Output goes through
//! `writer: &mut dyn Write` so tests can capture it and the global
//! `--output` flag can redirect it to a file.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `sqlb search` | [`search`] | Resolve rowids from stdin against a table b-tree |
//! | `sqlb info` | [`info`] | Decode the 100-byte file header |
//! | `sqlb pages` | [`pages`] | Print b-tree page headers and cell summaries |
//! | `sqlb dump` | [`dump`] | Hex dump of one page |
//!
//! `sqlb completions <shell>` is handled directly in `main.rs`.

pub mod app;
pub mod dump;
pub mod info;
pub mod pages;
pub mod search;

/// Write a line to the given writer, converting io::Error to SqlbError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::SqlbError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::SqlbError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use crate::sqlite::pager::Pager;
use crate::SqlbError;

/// Open a database, bypassing header page-size detection when `page_size`
/// is given.
pub(crate) fn open_pager(path: &str, page_size: Option<u32>) -> Result<Pager, SqlbError> {
    match page_size {
        Some(ps) => Pager::open_with_page_size(path, ps),
        None => Pager::open(path),
    }
}
