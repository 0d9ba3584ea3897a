use std::sync::Arc;

use crate::common::error::{DbError, DbResult};
use crate::execution::OpIterator;
use crate::storage::buffer::BufferPool;
use crate::storage::heap_file::HeapFileIterator;
use crate::storage::tuple::{Tuple, TupleDesc};
use crate::transaction::TransactionId;

/// Sequential scan over a heap table, pulling pages through the buffer
/// pool under read locks. Output columns are qualified with the table
/// alias (`alias.column`).
pub struct SeqScan {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    table_id: u32,
    alias: String,
    iter: Option<HeapFileIterator>,
}

impl SeqScan {
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, table_id: u32, alias: &str) -> Self {
        SeqScan {
            pool,
            tid,
            table_id,
            alias: alias.to_string(),
            iter: None,
        }
    }

    fn iter_mut(&mut self) -> DbResult<&mut HeapFileIterator> {
        self.iter
            .as_mut()
            .ok_or_else(|| DbError::InvalidOperation("scan is not open".to_string()))
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        let file = self.pool.catalog().database_file(self.table_id)?;
        let mut iter = file.iterator(self.tid, Arc::clone(&self.pool))?;
        iter.open()?;
        self.iter = Some(iter);
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.iter_mut()?.has_next()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        self.iter_mut()?.next()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.iter_mut()?.rewind()
    }

    fn close(&mut self) {
        if let Some(iter) = self.iter.as_mut() {
            iter.close();
        }
        self.iter = None;
    }

    fn tuple_desc(&self) -> TupleDesc {
        // Failure to resolve the table here would already have failed at
        // construction time of any plan using this scan; fall back to an
        // empty schema rather than panicking.
        let desc = match self.pool.catalog().tuple_desc(self.table_id) {
            Ok(desc) => desc,
            Err(_) => return TupleDesc::unnamed(vec![]),
        };
        let names = (0..desc.num_fields())
            .map(|i| format!("{}.{}", self.alias, desc.field_name(i)))
            .collect();
        TupleDesc::new(desc.types().to_vec(), names)
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator>>) {}
}
