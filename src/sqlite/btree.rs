//! Rowid lookup in a table b-tree.
//!
//! A search starts at the root page and moves down one level per step:
//!
//! ```text
//! Descending(root) --interior--> Descending(child) --...--> leaf
//!                                                           |-- rowid present --> Found(record)
//!                                                           `-- rowid absent  --> NotFound
//! ```
//!
//! On every page the cells are binary searched for the first key greater
//! than or equal to the target. An interior cell's left child holds every
//! rowid up to and including its key; rowids above the last key live under
//! the page's right-most child.
//!
//! The descent is a loop, not recursion, and stops with
//! [`SqlbError::Corrupt`] once it exceeds the depth limit, so a page cycle
//! in a damaged file cannot hang a lookup.

use tracing::debug;

use crate::sqlite::constants::MAX_BTREE_DEPTH;
use crate::sqlite::overflow::read_payload;
use crate::sqlite::page::{BtreePage, LeafPage};
use crate::sqlite::pager::Pager;
use crate::sqlite::record::Record;
use crate::SqlbError;

/// One state of a rowid descent.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// Next page to visit.
    Descending(u32),
    /// The rowid was found; terminal.
    Found(Record),
    /// The rowid is not in the tree; terminal.
    NotFound,
}

/// A table b-tree rooted at a given page.
#[derive(Debug, Clone, Copy)]
pub struct BTree<'p> {
    pager: &'p Pager,
    root: u32,
    max_depth: u64,
}

impl<'p> BTree<'p> {
    /// A tree rooted at `root`. The depth limit defaults to the number of
    /// pages in the file, capped at SQLite's own maximum b-tree depth.
    pub fn new(pager: &'p Pager, root: u32) -> Self {
        BTree {
            pager,
            root,
            max_depth: pager.page_count().clamp(1, MAX_BTREE_DEPTH),
        }
    }

    /// Override the depth limit.
    pub fn with_max_depth(mut self, max_depth: u64) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    pub fn max_depth(&self) -> u64 {
        self.max_depth
    }

    /// Fetch and parse page `page_number` as a table b-tree page.
    pub fn load_page(&self, page_number: u32) -> Result<BtreePage<'p>, SqlbError> {
        let content = self.pager.page(page_number)?;
        BtreePage::parse(page_number, content, self.pager.usable_size())
    }

    /// Look up `rowid`, returning its decoded record or `None` if the tree
    /// does not contain it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sqlb::sqlite::btree::BTree;
    /// use sqlb::sqlite::pager::Pager;
    ///
    /// let pager = Pager::open("app.db").unwrap();
    /// let users = BTree::new(&pager, 2);
    /// if let Some(row) = users.search(7).unwrap() {
    ///     println!("row 7 has {} columns", row.len());
    /// }
    /// ```
    pub fn search(&self, rowid: i64) -> Result<Option<Record>, SqlbError> {
        let mut state = SearchState::Descending(self.root);
        let mut depth = 0u64;
        loop {
            match state {
                SearchState::Descending(page_number) => {
                    depth += 1;
                    if depth > self.max_depth {
                        return Err(SqlbError::Corrupt(format!(
                            "Descent for rowid {} from root {} exceeded {} levels",
                            rowid, self.root, self.max_depth
                        )));
                    }
                    state = self.step(page_number, rowid)?;
                }
                SearchState::Found(record) => return Ok(Some(record)),
                SearchState::NotFound => return Ok(None),
            }
        }
    }

    /// Visit one page of the descent and return the next state.
    pub fn step(&self, page_number: u32, rowid: i64) -> Result<SearchState, SqlbError> {
        let page = self.load_page(page_number)?;
        match page {
            BtreePage::Leaf(leaf) => {
                let index = lower_bound(leaf.cell_count(), |i| leaf.rowid(i), rowid)?;
                let found = index < leaf.cell_count() && leaf.rowid(index)? == rowid;
                debug!(page = page_number, cells = leaf.cell_count(), index, found, "leaf");
                if found {
                    Ok(SearchState::Found(self.read_record(&leaf, index)?))
                } else {
                    Ok(SearchState::NotFound)
                }
            }
            BtreePage::Interior(interior) => {
                let count = interior.cell_count();
                let index = lower_bound(count, |i| interior.rowid(i), rowid)?;
                let child = if index < count {
                    interior.left_child(index)?
                } else {
                    interior.right_most_child()
                };
                debug!(page = page_number, cells = count, index, child, "interior");
                if child == 0 {
                    Ok(SearchState::NotFound)
                } else {
                    Ok(SearchState::Descending(child))
                }
            }
        }
    }

    fn read_record(&self, leaf: &LeafPage<'p>, index: usize) -> Result<Record, SqlbError> {
        let cell = leaf.cell(index)?;
        let payload = read_payload(self.pager, &cell)?;
        Record::decode(&payload)
    }
}

/// Look up `rowid` in the table b-tree rooted at `root`.
pub fn search(pager: &Pager, root: u32, rowid: i64) -> Result<Option<Record>, SqlbError> {
    BTree::new(pager, root).search(rowid)
}

/// Index of the first of `count` ascending keys that is `>= target`, or
/// `count` if every key is smaller.
pub fn lower_bound<F>(count: usize, key_at: F, target: i64) -> Result<usize, SqlbError>
where
    F: Fn(usize) -> Result<i64, SqlbError>,
{
    let (mut lo, mut hi) = (0usize, count);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key_at(mid)? < target {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
