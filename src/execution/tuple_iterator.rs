use crate::common::error::{DbError, DbResult};
use crate::execution::OpIterator;
use crate::storage::tuple::{Tuple, TupleDesc};

/// Operator over an in-memory tuple list. Leaf of aggregation results and
/// a convenient test source.
pub struct TupleIterator {
    desc: TupleDesc,
    tuples: Vec<Tuple>,
    pos: usize,
    opened: bool,
}

impl TupleIterator {
    pub fn new(desc: TupleDesc, tuples: Vec<Tuple>) -> Self {
        TupleIterator {
            desc,
            tuples,
            pos: 0,
            opened: false,
        }
    }
}

impl OpIterator for TupleIterator {
    fn open(&mut self) -> DbResult<()> {
        self.pos = 0;
        self.opened = true;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(self.opened && self.pos < self.tuples.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::InvalidOperation(
                "next() on an exhausted iterator".to_string(),
            ));
        }
        let tuple = self.tuples[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn tuple_desc(&self) -> TupleDesc {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator>>) {}
}
