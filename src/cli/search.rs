use std::io::{BufRead, Write};

use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::{open_pager, wprintln};
use crate::sqlite::btree::BTree;
use crate::sqlite::record::Record;
use crate::SqlbError;

/// Options for the `sqlb search` subcommand.
pub struct SearchOptions {
    /// Path to the database file.
    pub file: String,
    /// Root page of the table b-tree to search.
    pub root: u32,
    /// Emit one JSON object per rowid.
    pub json: bool,
    /// Worker threads; 1 resolves each rowid as soon as it is read.
    pub threads: usize,
    /// Override the page size recorded in the file header.
    pub page_size: Option<u32>,
    /// Override the default descent depth limit.
    pub max_depth: Option<u64>,
}

#[derive(Serialize)]
struct SearchResultJson<'a> {
    rowid: i64,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Resolve newline-delimited decimal rowids from `input` against the table
/// b-tree rooted at `opts.root`.
///
/// Surrounding whitespace is trimmed and blank lines are ignored. Lines that
/// are not UTF-8 or not a decimal integer are logged and skipped. A rowid whose lookup
/// fails (corrupt page, unsupported page type, ...) is reported in the
/// output and the batch continues; only failing to open the database or to
/// read `input` aborts the run.
pub fn execute(
    opts: &SearchOptions,
    input: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<(), SqlbError> {
    if opts.root == 0 {
        return Err(SqlbError::Argument(
            "Root page numbers start at 1".to_string(),
        ));
    }

    let pager = open_pager(&opts.file, opts.page_size)?;
    let mut tree = BTree::new(&pager, opts.root);
    if let Some(depth) = opts.max_depth {
        tree = tree.with_max_depth(depth);
    }
    debug!(
        file = %opts.file,
        root = opts.root,
        page_size = pager.page_size(),
        pages = pager.page_count(),
        max_depth = tree.max_depth(),
        "opened database"
    );

    if opts.threads > 1 {
        let rowids = read_rowids(input)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.threads)
            .build()
            .map_err(|e| SqlbError::Argument(format!("Cannot start {} threads: {}", opts.threads, e)))?;
        let results: Vec<_> =
            pool.install(|| rowids.par_iter().map(|&id| (id, tree.search(id))).collect());
        for (rowid, result) in results {
            report(opts, writer, rowid, result)?;
        }
        return Ok(());
    }

    let mut line = Vec::new();
    let mut line_no = 0usize;
    while read_raw_line(input, &mut line)? {
        line_no += 1;
        if let Some(rowid) = parse_rowid(&line, line_no) {
            report(opts, writer, rowid, tree.search(rowid))?;
        }
    }
    Ok(())
}

/// Read every rowid up front for the parallel path.
fn read_rowids(input: &mut dyn BufRead) -> Result<Vec<i64>, SqlbError> {
    let mut rowids = Vec::new();
    let mut line = Vec::new();
    let mut line_no = 0usize;
    while read_raw_line(input, &mut line)? {
        line_no += 1;
        rowids.extend(parse_rowid(&line, line_no));
    }
    Ok(rowids)
}

/// Read one line as raw bytes into `buf`. Returns `false` at end of input.
fn read_raw_line(input: &mut dyn BufRead, buf: &mut Vec<u8>) -> Result<bool, SqlbError> {
    buf.clear();
    let n = input
        .read_until(b'\n', buf)
        .map_err(|e| SqlbError::Io(format!("Cannot read stdin: {}", e)))?;
    Ok(n > 0)
}

fn parse_rowid(line: &[u8], line_no: usize) -> Option<i64> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => {
            warn!(line = line_no, error = %e, "skipping line that is not UTF-8");
            return None;
        }
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(rowid) => Some(rowid),
        Err(e) => {
            warn!(line = line_no, input = %trimmed, error = %e, "skipping unparsable rowid");
            None
        }
    }
}

fn report(
    opts: &SearchOptions,
    writer: &mut dyn Write,
    rowid: i64,
    result: Result<Option<Record>, SqlbError>,
) -> Result<(), SqlbError> {
    if let Err(ref e) = result {
        warn!(rowid, error = %e, "lookup failed");
    }

    if opts.json {
        let json = match &result {
            Ok(record) => SearchResultJson {
                rowid,
                found: record.is_some(),
                values: record.as_ref(),
                error: None,
            },
            Err(e) => SearchResultJson {
                rowid,
                found: false,
                values: None,
                error: Some(e.to_string()),
            },
        };
        let line = serde_json::to_string(&json)
            .map_err(|e| SqlbError::Io(format!("JSON serialization error: {}", e)))?;
        return wprintln!(writer, "{}", line);
    }

    match result {
        Ok(Some(record)) => wprintln!(writer, "{}\t{}", rowid, record),
        Ok(None) => wprintln!(writer, "{}\t{}", rowid, "not found".yellow()),
        Err(e) => wprintln!(writer, "{}\t{}", rowid, format!("error: {}", e).red()),
    }
}
