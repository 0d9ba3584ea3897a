use std::cmp::Ordering;
use std::fmt;

use crate::common::error::DbResult;
use crate::storage::tuple::{Field, Tuple};

/// Comparison operators usable in predicates and selectivity estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    NotEquals,
}

impl PredOp {
    /// Interpret an ordering between two values under this operator.
    pub fn apply_ord(&self, ord: Ordering) -> bool {
        match self {
            PredOp::Equals => ord == Ordering::Equal,
            PredOp::GreaterThan => ord == Ordering::Greater,
            PredOp::LessThan => ord == Ordering::Less,
            PredOp::LessThanOrEq => ord != Ordering::Greater,
            PredOp::GreaterThanOrEq => ord != Ordering::Less,
            PredOp::NotEquals => ord != Ordering::Equal,
        }
    }
}

impl fmt::Display for PredOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredOp::Equals => "=",
            PredOp::GreaterThan => ">",
            PredOp::LessThan => "<",
            PredOp::LessThanOrEq => "<=",
            PredOp::GreaterThanOrEq => ">=",
            PredOp::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// Compares one tuple field against a constant.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: usize,
    op: PredOp,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: PredOp, operand: Field) -> Self {
        Predicate { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> PredOp {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// Whether `tuple` satisfies this predicate.
    pub fn filter(&self, tuple: &Tuple) -> DbResult<bool> {
        tuple.field(self.field).compare(self.op, &self.operand)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}
