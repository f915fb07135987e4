use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_pager, wprintln};
use crate::sqlite::header::{btree_header_offset, BtreeHeader};
use crate::sqlite::page::{BtreePage, CellSummary};
use crate::sqlite::page_types::PageType;
use crate::sqlite::pager::Pager;
use crate::util::hex::format_offset;
use crate::SqlbError;

/// Options for the `sqlb pages` subcommand.
pub struct PagesOptions {
    /// Path to the database file.
    pub file: String,
    /// Show only this page; every page when `None`.
    pub page: Option<u32>,
    /// Emit output as JSON.
    pub json: bool,
    /// Override the page size recorded in the file header.
    pub page_size: Option<u32>,
}

/// JSON-serializable page report.
#[derive(Serialize)]
struct PageJson {
    page_number: u32,
    page_type: PageType,
    page_type_name: &'static str,
    byte_start: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<BtreeHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cells: Option<Vec<CellSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Print the b-tree header and cell summaries of one page or of every page.
///
/// Only table b-tree pages are decoded. Index pages and pages that are not
/// b-tree pages at all (overflow, freelist, pointer-map) are listed as
/// unsupported. A page that fails to decode is reported and the scan moves
/// on; a page number outside the file is an error.
pub fn execute(opts: &PagesOptions, writer: &mut dyn Write) -> Result<(), SqlbError> {
    let pager = open_pager(&opts.file, opts.page_size)?;

    let pages: Vec<u32> = match opts.page {
        Some(p) => {
            pager.page(p)?;
            vec![p]
        }
        None => (1..=pager.page_count().min(u32::MAX as u64) as u32).collect(),
    };

    let reports: Vec<PageJson> = pages.into_iter().map(|n| inspect(&pager, n)).collect();

    if opts.json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| SqlbError::Io(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", out)?;
        return Ok(());
    }

    for report in &reports {
        print_page(writer, report)?;
    }
    Ok(())
}

fn inspect(pager: &Pager, page_number: u32) -> PageJson {
    let byte_start = (page_number as u64 - 1) * pager.page_size() as u64;
    let mut report = PageJson {
        page_number,
        page_type: PageType::Unknown(0),
        page_type_name: PageType::Unknown(0).name(),
        byte_start,
        header: None,
        cells: None,
        error: None,
    };

    let content = match pager.page(page_number) {
        Ok(c) => c,
        Err(e) => {
            report.error = Some(e.to_string());
            return report;
        }
    };
    let type_byte = content
        .get(btree_header_offset(page_number))
        .copied()
        .unwrap_or(0);
    report.page_type = PageType::from_u8(type_byte);
    report.page_type_name = report.page_type.name();
    if !report.page_type.is_supported() {
        return report;
    }

    let parsed = BtreePage::parse(page_number, content, pager.usable_size())
        .and_then(|page| Ok((page.header().clone(), page.cell_summaries()?)));
    match parsed {
        Ok((header, cells)) => {
            report.header = Some(header);
            report.cells = Some(cells);
        }
        Err(e) => report.error = Some(e.to_string()),
    }
    report
}

fn print_page(writer: &mut dyn Write, report: &PageJson) -> Result<(), SqlbError> {
    wprintln!(
        writer,
        "{}",
        format!(
            "Page {} at {}: {}",
            report.page_number,
            format_offset(report.byte_start),
            report.page_type
        )
        .bold()
    )?;

    if let Some(ref e) = report.error {
        wprintln!(writer, "  {}", e.red())?;
        return Ok(());
    }

    let Some(ref header) = report.header else {
        wprintln!(writer, "  {}", "not a table b-tree page, skipped".dimmed())?;
        return Ok(());
    };

    wprintln!(
        writer,
        "  Cells: {}  Content start: {}  First freeblock: {}  Fragmented: {}",
        header.cell_count,
        header.content_start,
        header.first_freeblock,
        header.fragmented_bytes
    )?;
    if let Some(child) = header.right_most_child {
        wprintln!(writer, "  Right-most child: {}", child)?;
    }

    for cell in report.cells.iter().flatten() {
        match cell.left_child {
            Some(child) => wprintln!(
                writer,
                "  [{:>4}] @{:<5} rowid <= {:<12} -> page {}",
                cell.index,
                cell.offset,
                cell.rowid,
                child
            )?,
            None => {
                let overflow = cell
                    .overflow_page
                    .map(|p| format!(" overflow -> page {}", p))
                    .unwrap_or_default();
                wprintln!(
                    writer,
                    "  [{:>4}] @{:<5} rowid {:<12} payload {} bytes{}",
                    cell.index,
                    cell.offset,
                    cell.rowid,
                    cell.payload_size.unwrap_or(0),
                    overflow
                )?
            }
        }
    }
    Ok(())
}
