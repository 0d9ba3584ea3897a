// Aggregation
//
// Aggregate drains its child into a grouped accumulator, then streams
// the per-group results. Integer columns support SUM/COUNT/MIN/MAX/AVG;
// string columns support COUNT only.

pub mod integer;
pub mod string;

pub use integer::IntegerAggregator;
pub use string::StringAggregator;

use std::fmt;

use crate::common::error::{DbError, DbResult};
use crate::execution::tuple_iterator::TupleIterator;
use crate::execution::OpIterator;
use crate::storage::tuple::{Tuple, TupleDesc, Type};

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggOp::Min => "MIN",
            AggOp::Max => "MAX",
            AggOp::Sum => "SUM",
            AggOp::Avg => "AVG",
            AggOp::Count => "COUNT",
        };
        write!(f, "{}", s)
    }
}

/// Grouped streaming accumulator: tuples are merged one at a time and
/// the results read back as an operator.
pub trait Aggregator {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()>;

    /// Result stream: `(groupValue, aggValue)` pairs, or a single
    /// `(aggValue)` when there is no grouping.
    fn iterator(&self) -> TupleIterator;
}

/// The aggregation operator. `gfield` of `None` means a single global
/// group.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    afield: usize,
    gfield: Option<usize>,
    op: AggOp,
    results: Option<TupleIterator>,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggOp,
    ) -> DbResult<Self> {
        // Aggregator construction is deferred to open(): a string column
        // with a non-COUNT op must still fail fast, so validate here.
        let child_desc = child.tuple_desc();
        if child_desc.field_type(afield) == Type::Text && op != AggOp::Count {
            return Err(DbError::InvalidOperation(format!(
                "{} is not supported over text columns",
                op
            )));
        }
        Ok(Aggregate {
            child,
            afield,
            gfield,
            op,
            results: None,
        })
    }

    pub fn aggregate_op(&self) -> AggOp {
        self.op
    }

    pub fn group_field(&self) -> Option<usize> {
        self.gfield
    }

    pub fn aggregate_field(&self) -> usize {
        self.afield
    }

    fn build_aggregator(&self) -> DbResult<Box<dyn Aggregator>> {
        let child_desc = self.child.tuple_desc();
        let group_by = self
            .gfield
            .map(|g| (g, child_desc.field_type(g)));
        match child_desc.field_type(self.afield) {
            Type::Int => Ok(Box::new(IntegerAggregator::new(
                group_by,
                self.afield,
                self.op,
            ))),
            Type::Text => Ok(Box::new(StringAggregator::new(
                group_by,
                self.afield,
                self.op,
            )?)),
        }
    }

    fn results_mut(&mut self) -> DbResult<&mut TupleIterator> {
        self.results
            .as_mut()
            .ok_or_else(|| DbError::InvalidOperation("aggregate is not open".to_string()))
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        let mut aggregator = self.build_aggregator()?;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            aggregator.merge(&tuple)?;
        }
        let mut results = aggregator.iterator();
        results.open()?;
        self.results = Some(results);
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.results_mut()?.has_next()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        self.results_mut()?.next()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.results_mut()?.rewind()
    }

    fn close(&mut self) {
        if let Some(results) = self.results.as_mut() {
            results.close();
        }
        self.results = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> TupleDesc {
        let child_desc = self.child.tuple_desc();
        let agg_name = format!("{}({})", self.op, child_desc.field_name(self.afield));
        match self.gfield {
            None => TupleDesc::new(vec![Type::Int], vec![agg_name]),
            Some(g) => TupleDesc::new(
                vec![child_desc.field_type(g), Type::Int],
                vec![child_desc.field_name(g).to_string(), agg_name],
            ),
        }
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
