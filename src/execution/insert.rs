use std::sync::Arc;

use crate::common::error::{DbError, DbResult};
use crate::execution::OpIterator;
use crate::storage::buffer::BufferPool;
use crate::storage::tuple::{Field, Tuple, TupleDesc, Type};
use crate::transaction::TransactionId;

/// Drains its child into a table through the buffer pool and yields a
/// single one-column tuple with the number of rows inserted.
pub struct Insert {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    table_id: u32,
    done: bool,
}

impl Insert {
    /// Fails when the child's schema does not match the target table's.
    pub fn new(
        pool: Arc<BufferPool>,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> DbResult<Self> {
        let table_desc = pool.catalog().tuple_desc(table_id)?;
        if child.tuple_desc() != table_desc {
            return Err(DbError::SchemaMismatch(format!(
                "child schema does not match table {}",
                table_id
            )));
        }
        Ok(Insert {
            pool,
            tid,
            child,
            table_id,
            done: false,
        })
    }

    fn count_desc() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec!["inserted".to_string()])
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if self.done {
            return Err(DbError::InvalidOperation(
                "insert already executed".to_string(),
            ));
        }
        let mut count = 0i32;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.pool.insert_tuple(self.tid, self.table_id, tuple)?;
            count += 1;
        }
        self.done = true;
        Ok(Tuple::new(Self::count_desc(), vec![Field::Int(count)]))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn tuple_desc(&self) -> TupleDesc {
        Self::count_desc()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) {
        if let Some(child) = children.into_iter().next() {
            self.child = child;
        }
    }
}
