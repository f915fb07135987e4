use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::sqlite::header::FileHeader;
use crate::sqlite::pager::Pager;
use crate::util::hex::format_hex32;
use crate::SqlbError;

/// Options for the `sqlb info` subcommand.
pub struct InfoOptions {
    /// Path to the database file.
    pub file: String,
    /// Emit output as JSON.
    pub json: bool,
}

#[derive(Serialize)]
struct InfoJson<'a> {
    file: &'a str,
    file_size: u64,
    page_count: u64,
    usable_size: u32,
    text_encoding_name: &'static str,
    header: &'a FileHeader,
}

/// Print the decoded 100-byte file header together with the page count and
/// usable page size derived from it.
///
/// Older writers leave the in-header database size stale, so a mismatch
/// with the page count computed from the file length is flagged rather than
/// treated as an error.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), SqlbError> {
    let pager = Pager::open(&opts.file)?;
    let header = pager.header().ok_or_else(|| {
        SqlbError::MalformedHeader(format!("{} has no readable file header", opts.file))
    })?;

    if opts.json {
        let json = InfoJson {
            file: &opts.file,
            file_size: pager.file_size(),
            page_count: pager.page_count(),
            usable_size: pager.usable_size(),
            text_encoding_name: header.text_encoding_name(),
            header,
        };
        let out = serde_json::to_string_pretty(&json)
            .map_err(|e| SqlbError::Io(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", out)?;
        return Ok(());
    }

    wprintln!(writer, "{}", format!("Database: {}", opts.file).bold())?;
    wprintln!(writer, "  File size:         {} bytes", pager.file_size())?;
    wprintln!(writer, "  Page size:         {}", header.page_size)?;
    wprintln!(
        writer,
        "  Usable size:       {} ({} reserved)",
        header.usable_size(),
        header.reserved_space
    )?;
    wprintln!(writer, "  Pages (file):      {}", pager.page_count())?;
    if header.database_size as u64 == pager.page_count() {
        wprintln!(writer, "  Pages (header):    {}", header.database_size)?;
    } else {
        wprintln!(
            writer,
            "  Pages (header):    {} {}",
            header.database_size,
            "(differs from file length)".yellow()
        )?;
    }
    wprintln!(
        writer,
        "  Format versions:   write {}, read {}",
        header.write_version,
        header.read_version
    )?;
    wprintln!(writer, "  Change counter:    {}", header.change_counter)?;
    wprintln!(
        writer,
        "  Freelist:          {} pages, first trunk {}",
        header.freelist_count,
        header.freelist_trunk
    )?;
    wprintln!(writer, "  Schema cookie:     {}", header.schema_cookie)?;
    wprintln!(writer, "  Schema format:     {}", header.schema_format)?;
    wprintln!(
        writer,
        "  Text encoding:     {} ({})",
        header.text_encoding_name(),
        header.text_encoding
    )?;
    wprintln!(writer, "  User version:      {}", header.user_version)?;
    wprintln!(
        writer,
        "  Application id:    {}",
        format_hex32(header.application_id)
    )?;
    wprintln!(writer, "  SQLite version:    {}", format_version(header.version_number))?;

    Ok(())
}

/// Render SQLITE_VERSION_NUMBER (e.g. 3045001) as "3.45.1".
fn format_version(number: u32) -> String {
    if number == 0 {
        return "unknown".to_string();
    }
    format!(
        "{}.{}.{}",
        number / 1_000_000,
        number / 1_000 % 1_000,
        number % 1_000
    )
}
