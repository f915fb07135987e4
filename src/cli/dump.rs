use std::io::Write;

use crate::cli::{open_pager, wprintln};
use crate::util::hex::hex_dump;
use crate::SqlbError;

pub struct DumpOptions {
    pub file: String,
    pub page: Option<u32>,
    pub length: Option<usize>,
    pub raw: bool,
    pub page_size: Option<u32>,
}

/// Hex dump (or raw copy) of one page, page 1 by default.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), SqlbError> {
    let pager = open_pager(&opts.file, opts.page_size)?;
    let page_num = opts.page.unwrap_or(1);
    let page = pager.checkout(page_num)?;

    let dump_len = opts.length.unwrap_or(page.len()).min(page.len());
    let base_offset = (page_num as u64 - 1) * pager.page_size() as u64;

    if opts.raw {
        writer
            .write_all(&page[..dump_len])
            .map_err(|e| SqlbError::Io(format!("Cannot write output: {}", e)))?;
    } else {
        wprintln!(
            writer,
            "Hex dump of {} page {} ({} bytes):",
            opts.file, page_num, dump_len
        )?;
        wprintln!(writer)?;
        wprintln!(writer, "{}", hex_dump(&page[..dump_len], base_offset))?;
    }

    pager.put_page(page);
    Ok(())
}
