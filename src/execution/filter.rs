use crate::common::error::{DbError, DbResult};
use crate::execution::predicate::Predicate;
use crate::execution::OpIterator;
use crate::storage::tuple::{Tuple, TupleDesc};

/// Relational select: streams the child tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    pending: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Filter {
            predicate,
            child,
            pending: None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.pending = None;
        self.child.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.pending.is_none() {
            self.pending = self.fetch_next()?;
        }
        Ok(self.pending.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::InvalidOperation(
                "next() on an exhausted iterator".to_string(),
            ));
        }
        match self.pending.take() {
            Some(tuple) => Ok(tuple),
            None => Err(DbError::InvalidOperation(
                "next() on an exhausted iterator".to_string(),
            )),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.pending = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.pending = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> TupleDesc {
        self.child.tuple_desc()
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
