//! Reusable page buffers.
//!
//! Most readers borrow pages straight out of the mapping (see
//! [`Pager::page`](crate::sqlite::pager::Pager::page)). Callers that need an
//! owned copy of a page, for example to keep it after the pager is dropped or
//! to hand it to another thread, take one from a [`PagePool`] instead.
//!
//! A [`PooledPage`] is held exclusively by one caller. Dropping it (or
//! passing it to [`PagePool::release`]) returns the allocation to the pool's
//! free list, so a buffer can never be handed to a second caller while the
//! first still holds it.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Default number of idle buffers a pool keeps around.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// A thread-safe free list of page-sized buffers.
pub struct PagePool {
    page_size: usize,
    max_idle: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl PagePool {
    /// Create a pool of `page_size`-byte buffers that retains at most
    /// `max_idle` released buffers.
    pub fn new(page_size: usize, max_idle: usize) -> Self {
        PagePool {
            page_size,
            max_idle,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Size of every buffer handed out by this pool.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Take a buffer from the free list, allocating a new one if it is empty.
    ///
    /// The contents of a recycled buffer are whatever the previous holder
    /// left there; callers are expected to overwrite the whole page.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlb::sqlite::pool::PagePool;
    ///
    /// let pool = PagePool::new(512, 4);
    /// let mut buf = pool.acquire();
    /// buf[0] = 0x0d;
    /// assert_eq!(buf.len(), 512);
    /// pool.release(buf);
    /// assert_eq!(pool.idle(), 1);
    /// ```
    pub fn acquire(&self) -> PooledPage<'_> {
        let recycled = self.lock_free().pop();
        let buf = recycled.unwrap_or_else(|| vec![0u8; self.page_size]);
        PooledPage { buf, pool: self }
    }

    /// Return a buffer to the pool. Equivalent to dropping it.
    pub fn release(&self, page: PooledPage<'_>) {
        drop(page);
    }

    /// Number of buffers currently sitting on the free list.
    pub fn idle(&self) -> usize {
        self.lock_free().len()
    }

    fn put_back(&self, buf: Vec<u8>) {
        if buf.len() != self.page_size {
            return;
        }
        let mut free = self.lock_free();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }

    fn lock_free(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        // A panic while holding the lock cannot leave the free list in a
        // half-updated state, so a poisoned lock is still usable.
        self.free.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for PagePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagePool")
            .field("page_size", &self.page_size)
            .field("max_idle", &self.max_idle)
            .field("idle", &self.idle())
            .finish()
    }
}

/// A page buffer on loan from a [`PagePool`].
pub struct PooledPage<'p> {
    buf: Vec<u8>,
    pool: &'p PagePool,
}

impl PooledPage<'_> {
    /// Detach the buffer from the pool and keep it.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Deref for PooledPage<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledPage<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledPage<'_> {
    fn drop(&mut self) {
        // A detached buffer is empty and gets discarded by put_back.
        self.pool.put_back(std::mem::take(&mut self.buf));
    }
}

impl fmt::Debug for PooledPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledPage").field("len", &self.len()).finish()
    }
}
