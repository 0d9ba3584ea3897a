use std::sync::Arc;

use crate::common::error::{DbError, DbResult};
use crate::execution::OpIterator;
use crate::storage::buffer::BufferPool;
use crate::storage::tuple::{Field, Tuple, TupleDesc, Type};
use crate::transaction::TransactionId;

/// Deletes every tuple produced by its child (located via record id)
/// and yields a single one-column tuple with the number of rows removed.
pub struct Delete {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    done: bool,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Delete {
            pool,
            tid,
            child,
            done: false,
        }
    }

    fn count_desc() -> TupleDesc {
        TupleDesc::new(vec![Type::Int], vec!["deleted".to_string()])
    }
}

impl OpIterator for Delete {
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
                "delete already executed".to_string(),
            ));
        }
        let mut count = 0i32;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.pool.delete_tuple(self.tid, &tuple)?;
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
