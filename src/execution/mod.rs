// Query execution operators
//
// Volcano-style pull iterators: every operator produces one tuple per
// next() call and drives its children the same way.

pub mod agg;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod predicate;
pub mod seq_scan;
pub mod tuple_iterator;

pub use agg::{AggOp, Aggregate};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use predicate::{PredOp, Predicate};
pub use seq_scan::SeqScan;
pub use tuple_iterator::TupleIterator;

use crate::common::error::DbResult;
use crate::storage::tuple::{Tuple, TupleDesc};

/// The pull-iterator interface implemented by every execution operator.
///
/// Protocol: `open` before anything else; `has_next`/`next` stream the
/// output; `rewind` restarts the stream; `close` releases resources.
/// Transaction aborts surface through the `DbResult`s and must be
/// propagated after closing.
pub trait OpIterator {
    fn open(&mut self) -> DbResult<()>;

    fn has_next(&mut self) -> DbResult<bool>;

    fn next(&mut self) -> DbResult<Tuple>;

    fn rewind(&mut self) -> DbResult<()>;

    fn close(&mut self);

    /// Schema of the tuples this operator produces.
    fn tuple_desc(&self) -> TupleDesc;

    /// Child operators, in input order. Leaves return an empty vec.
    fn children(&self) -> Vec<&dyn OpIterator>;

    /// Replace the child operators. Leaves ignore the call.
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>);
}
