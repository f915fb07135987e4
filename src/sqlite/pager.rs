//! Read-only page access for SQLite database files.
//!
//! Provides [`Pager`], the entry point for opening a database. The file is
//! mapped into memory with `memmap2` and pages are handed out as borrowed
//! slices of the mapping, addressed by 1-based page number. The page size is
//! taken from the file header unless overridden.
//!
//! A `Pager` never writes and holds no interior mutability apart from its
//! buffer pool, so a shared `&Pager` can serve any number of concurrent
//! lookups.

use std::ops::Deref;

use memmap2::Mmap;

use crate::sqlite::constants::*;
use crate::sqlite::header::{validate_page_size, FileHeader};
use crate::sqlite::pool::{PagePool, PooledPage, DEFAULT_MAX_IDLE};
use crate::SqlbError;

/// Bytes backing a [`Pager`]: a read-only file mapping or an owned buffer.
enum Backing {
    Mapped(Mmap),
    Memory(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Memory(data) => data,
        }
    }
}

/// An open SQLite database, read-only.
pub struct Pager {
    data: Backing,
    header: Option<FileHeader>,
    page_size: u32,
    usable_size: u32,
    page_count: u64,
    pool: PagePool,
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("mapped", &matches!(self.data, Backing::Mapped(_)))
            .field("page_size", &self.page_size)
            .field("usable_size", &self.usable_size)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

impl Pager {
    /// Open a database file and read its page size from the file header.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sqlb::sqlite::pager::Pager;
    ///
    /// let pager = Pager::open("app.db").unwrap();
    /// println!("{} pages of {} bytes", pager.page_count(), pager.page_size());
    /// let page1 = pager.page(1).unwrap();
    /// assert_eq!(&page1[..15], b"SQLite format 3");
    /// ```
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, SqlbError> {
        let mmap = map_file(path.as_ref())?;
        Self::init(Backing::Mapped(mmap), None)
    }

    /// Open a database file with a specific page size (bypasses the page
    /// size recorded in the header).
    pub fn open_with_page_size<P: AsRef<std::path::Path>>(
        path: P,
        page_size: u32,
    ) -> Result<Self, SqlbError> {
        let mmap = map_file(path.as_ref())?;
        Self::init(Backing::Mapped(mmap), Some(page_size))
    }

    /// Create a pager over an in-memory database image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, SqlbError> {
        Self::init(Backing::Memory(data), None)
    }

    /// Create a pager over an in-memory database image with a specific page
    /// size.
    pub fn from_bytes_with_page_size(data: Vec<u8>, page_size: u32) -> Result<Self, SqlbError> {
        Self::init(Backing::Memory(data), Some(page_size))
    }

    fn init(data: Backing, forced_page_size: Option<u32>) -> Result<Self, SqlbError> {
        let parsed = FileHeader::parse(&data);
        let (header, page_size) = match forced_page_size {
            Some(ps) => {
                validate_page_size(ps)?;
                (parsed.ok(), ps)
            }
            None => {
                let hdr = parsed?;
                let ps = hdr.page_size;
                (Some(hdr), ps)
            }
        };

        let reserved = header.as_ref().map_or(0, |h| h.reserved_space as u32);
        let usable_size = page_size.saturating_sub(reserved);
        let page_count = data.len() as u64 / page_size as u64;

        Ok(Pager {
            data,
            header,
            page_size,
            usable_size,
            page_count,
            pool: PagePool::new(page_size as usize, DEFAULT_MAX_IDLE),
        })
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the bytes per page available to b-tree content (page size
    /// minus the reserved region recorded in the header).
    pub fn usable_size(&self) -> u32 {
        self.usable_size
    }

    /// Returns the number of whole pages in the file.
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Returns the length of the mapped file in bytes.
    pub fn file_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns the parsed file header. Always present for pagers opened
    /// without a page size override.
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Returns the byte range `[(n-1)*page_size, n*page_size)` of the file.
    ///
    /// Fails with [`SqlbError::OutOfRange`] if `page_number` is 0 or the
    /// range extends past the end of the file; nothing outside the mapping
    /// is ever read.
    pub fn get_page(&self, page_number: u32, page_size: u32) -> Result<&[u8], SqlbError> {
        let out_of_range = || SqlbError::OutOfRange {
            page: page_number as u64,
            page_count: self.data.len() as u64 / page_size.max(1) as u64,
        };
        if page_number == 0 || page_size == 0 {
            return Err(out_of_range());
        }
        let start = (page_number as u64 - 1) * page_size as u64;
        let end = start + page_size as u64;
        if end > self.data.len() as u64 {
            return Err(out_of_range());
        }
        Ok(&self.data[start as usize..end as usize])
    }

    /// Returns page `page_number` using the pager's page size.
    pub fn page(&self, page_number: u32) -> Result<&[u8], SqlbError> {
        self.get_page(page_number, self.page_size)
    }

    /// Copy page `page_number` into a buffer from the pager's pool.
    ///
    /// The returned buffer is owned by the caller until it is dropped or
    /// handed back with [`put_page`](Self::put_page).
    pub fn checkout(&self, page_number: u32) -> Result<PooledPage<'_>, SqlbError> {
        let src = self.page(page_number)?;
        let mut buf = self.pool.acquire();
        buf.copy_from_slice(src);
        Ok(buf)
    }

    /// Return a buffer obtained from [`checkout`](Self::checkout) to the pool.
    pub fn put_page(&self, page: PooledPage<'_>) {
        self.pool.release(page);
    }

    /// Returns the pool backing [`checkout`](Self::checkout).
    pub fn pool(&self) -> &PagePool {
        &self.pool
    }
}

/// Map `path` read-only.
///
/// The mapping is advised for random access, matching the b-tree descent
/// pattern; a rejected hint is logged and ignored.
fn map_file(path: &std::path::Path) -> Result<Mmap, SqlbError> {
    let file = std::fs::File::open(path)
        .map_err(|e| SqlbError::Io(format!("Cannot open {}: {}", path.display(), e)))?;

    let file_size = file
        .metadata()
        .map_err(|e| SqlbError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
        .len();
    if file_size < FILE_HEADER_SIZE as u64 {
        return Err(SqlbError::MalformedHeader(format!(
            "{} is {} bytes, too small to hold a database header",
            path.display(),
            file_size
        )));
    }

    // SAFETY: the mapping is read-only. Another process truncating or
    // rewriting the file while it is mapped is outside what a read-only
    // inspection tool can guard against.
    let mmap = unsafe {
        Mmap::map(&file)
            .map_err(|e| SqlbError::Io(format!("Cannot mmap {}: {}", path.display(), e)))?
    };

    #[cfg(unix)]
    if let Err(e) = mmap.advise(memmap2::Advice::Random) {
        tracing::warn!(path = %path.display(), error = %e, "madvise(RANDOM) failed");
    }

    Ok(mmap)
}
