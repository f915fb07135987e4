//! Integration tests for sqlite-btree-utils.
//!
//! These tests write synthetic SQLite database files to disk and run the
//! full open -> descend -> decode pipeline against them.

mod common;

use common::*;
use sqlb::sqlite::btree::BTree;
use sqlb::sqlite::pager::Pager;
use sqlb::sqlite::record::Value;
use sqlb::SqlbError;

fn sample_database() -> Vec<u8> {
    let mut rows = sample_rows(300);
    rows.push((
        1000,
        encode_record(&[Col::Int(1000), Col::Blob(pattern_blob(5000))]),
    ));
    build_database(&rows, 30)
}

#[test]
fn test_open_reads_header() {
    let image = sample_database();
    let tmp = write_temp(&image);
    let pager = Pager::open(tmp.path()).unwrap();

    assert_eq!(pager.page_size() as usize, PAGE_SIZE);
    assert_eq!(pager.page_count() as usize, image.len() / PAGE_SIZE);
    let header = pager.header().unwrap();
    assert_eq!(header.database_size as u64, pager.page_count());
    assert_eq!(header.text_encoding_name(), "UTF-8");
    assert_eq!(header.version_number, 3_045_001);
}

#[test]
fn test_every_row_is_found() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);

    for id in 1..=300i64 {
        let record = tree
            .search(id)
            .unwrap()
            .unwrap_or_else(|| panic!("rowid {} missing", id));
        assert_eq!(
            record.values(),
            &[Value::Integer(id), Value::Text(format!("row-{}", id))]
        );
    }
}

#[test]
fn test_absent_rowids() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);

    for id in [0i64, -5, 301, 999, 1001, i64::MAX] {
        assert!(tree.search(id).unwrap().is_none(), "rowid {} should be absent", id);
    }
}

#[test]
fn test_overflow_row_is_reassembled() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let record = BTree::new(&pager, ROOT_PAGE).search(1000).unwrap().unwrap();

    assert_eq!(record.get(0), Some(&Value::Integer(1000)));
    assert_eq!(record.get(1), Some(&Value::Blob(pattern_blob(5000))));
}

#[test]
fn test_repeated_search_is_identical() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);

    let first = tree.search(157).unwrap();
    let second = tree.search(157).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_searches_share_pager() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);

    std::thread::scope(|s| {
        for t in 0..4i64 {
            s.spawn(move || {
                for id in (1 + t..=300).step_by(4) {
                    let record = tree.search(id).unwrap().unwrap();
                    assert_eq!(record.get(0), Some(&Value::Integer(id)));
                }
            });
        }
    });
}

#[test]
fn test_single_leaf_tree() {
    let tmp = write_temp(&build_database(&sample_rows(5), 30));
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);
    assert!(tree.search(3).unwrap().is_some());
    assert!(tree.search(6).unwrap().is_none());
}

#[test]
fn test_empty_schema_root_on_page_one() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    assert!(BTree::new(&pager, 1).search(1).unwrap().is_none());
}

#[test]
fn test_root_beyond_file_is_out_of_range() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();
    let past_end = pager.page_count() as u32 + 1;
    assert!(matches!(
        BTree::new(&pager, past_end).search(1),
        Err(SqlbError::OutOfRange { .. })
    ));
    assert!(matches!(pager.page(0), Err(SqlbError::OutOfRange { .. })));
}

#[test]
fn test_index_page_is_rejected() {
    let mut image = sample_database();
    // Turn the leaf holding rowids 31..=60 into an index leaf.
    set_page_type(&mut image, 4, 0x0a);
    let tmp = write_temp(&image);
    let pager = Pager::open(tmp.path()).unwrap();
    let tree = BTree::new(&pager, ROOT_PAGE);

    assert!(matches!(
        tree.search(45),
        Err(SqlbError::UnsupportedPageType(0x0a))
    ));
    // Other subtrees are unaffected.
    assert!(tree.search(10).unwrap().is_some());
}

#[test]
fn test_truncated_file_fails_to_open() {
    let tmp = write_temp(&sample_database()[..60]);
    assert!(matches!(
        Pager::open(tmp.path()),
        Err(SqlbError::MalformedHeader(_))
    ));
}

#[test]
fn test_bad_magic_fails_to_open() {
    let mut image = sample_database();
    image[..6].copy_from_slice(b"NOTSQL");
    let tmp = write_temp(&image);
    assert!(matches!(
        Pager::open(tmp.path()),
        Err(SqlbError::MalformedHeader(_))
    ));
}

#[test]
fn test_page_size_override() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open_with_page_size(tmp.path(), 512).unwrap();
    assert_eq!(pager.page_size(), 512);
    assert_eq!(pager.page(3).unwrap().len(), 512);
}

#[test]
fn test_checkout_matches_mapping() {
    let tmp = write_temp(&sample_database());
    let pager = Pager::open(tmp.path()).unwrap();

    let copy = pager.checkout(3).unwrap();
    assert_eq!(&copy[..], pager.page(3).unwrap());
    pager.put_page(copy);
    assert_eq!(pager.pool().idle(), 1);
}
