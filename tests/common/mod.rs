use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use corvusdb::execution::{OpIterator, SeqScan};
use corvusdb::storage::page::{HeapPage, PageId};
use corvusdb::storage::tuple::{Field, Tuple, TupleDesc, Type};
use corvusdb::{Database, TransactionId};

/// A database rooted in a temp directory that lives as long as the
/// fixture.
pub struct TestDb {
    pub db: Database,
    dir: TempDir,
}

#[allow(dead_code)]
impl TestDb {
    /// Register a fresh heap table with the given schema.
    pub fn create_table(&self, name: &str, desc: TupleDesc) -> Result<u32> {
        let path = self.dir.path().join(format!("{}.tbl", name));
        Ok(self.db.add_table(path, desc, name)?)
    }

    /// Read every tuple in a table under a fresh committed transaction.
    pub fn scan_all(&self, table_id: u32) -> Result<Vec<Tuple>> {
        let tid = TransactionId::new();
        let tuples = self.scan_with(table_id, tid)?;
        self.db.buffer_pool().transaction_complete(tid, true)?;
        Ok(tuples)
    }

    /// Read every tuple in a table under the caller's transaction.
    pub fn scan_with(&self, table_id: u32, tid: TransactionId) -> Result<Vec<Tuple>> {
        let mut scan = SeqScan::new(Arc::clone(self.db.buffer_pool()), tid, table_id, "t");
        scan.open()?;
        let mut tuples = Vec::new();
        while scan.has_next()? {
            tuples.push(scan.next()?);
        }
        scan.close();
        Ok(tuples)
    }

    /// Write `count` pages of tuples straight to a table's backing file,
    /// one tuple per page, bypassing the buffer pool. Used to lay out
    /// multi-page tables for cache tests.
    pub fn seed_pages(&self, table_id: u32, count: usize) -> Result<Vec<PageId>> {
        let file = self.db.catalog().database_file(table_id)?;
        let desc = file.desc().clone();
        let mut pids = Vec::new();
        for page_no in 0..count {
            let pid = PageId::new(table_id, page_no);
            let mut page = HeapPage::new(pid, &HeapPage::empty_page_data(), desc.clone())?;
            page.insert_tuple(int_tuple(&desc, page_no as i32, 0))?;
            file.write_page(&page)?;
            pids.push(pid);
        }
        Ok(pids)
    }
}

#[allow(dead_code)]
pub fn open_test_db(pool_capacity: usize) -> Result<TestDb> {
    let dir = TempDir::new()?;
    let db = Database::open(dir.path().join("wal.log"), pool_capacity)?;
    Ok(TestDb { db, dir })
}

/// Two-integer-column schema used by most storage tests.
#[allow(dead_code)]
pub fn int_desc() -> TupleDesc {
    TupleDesc::new(
        vec![Type::Int, Type::Int],
        vec!["a".to_string(), "b".to_string()],
    )
}

#[allow(dead_code)]
pub fn int_tuple(desc: &TupleDesc, a: i32, b: i32) -> Tuple {
    Tuple::new(desc.clone(), vec![Field::Int(a), Field::Int(b)])
}

/// Sorted (a, b) pairs from a tuple list, for multiset comparison.
#[allow(dead_code)]
pub fn int_pairs(tuples: &[Tuple]) -> Vec<(i32, i32)> {
    let mut pairs: Vec<(i32, i32)> = tuples
        .iter()
        .map(|t| {
            let a = match t.field(0) {
                Field::Int(v) => *v,
                _ => panic!("expected int field"),
            };
            let b = match t.field(1) {
                Field::Int(v) => *v,
                _ => panic!("expected int field"),
            };
            (a, b)
        })
        .collect();
    pairs.sort_unstable();
    pairs
}
