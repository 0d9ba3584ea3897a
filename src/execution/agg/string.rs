use linked_hash_map::LinkedHashMap;

use crate::common::error::{DbError, DbResult};
use crate::execution::agg::{AggOp, Aggregator};
use crate::execution::tuple_iterator::TupleIterator;
use crate::storage::tuple::{Field, Tuple, TupleDesc, Type};

type GroupKey = Option<Field>;

/// Grouped aggregation over a string column. Only COUNT is meaningful;
/// constructing any other op is rejected.
pub struct StringAggregator {
    group_by: Option<(usize, Type)>,
    afield: usize,
    counts: LinkedHashMap<GroupKey, i32>,
}

impl StringAggregator {
    pub fn new(group_by: Option<(usize, Type)>, afield: usize, op: AggOp) -> DbResult<Self> {
        if op != AggOp::Count {
            return Err(DbError::InvalidOperation(format!(
                "{} is not supported over text columns",
                op
            )));
        }
        Ok(StringAggregator {
            group_by,
            afield,
            counts: LinkedHashMap::new(),
        })
    }

    fn result_desc(&self) -> TupleDesc {
        match self.group_by {
            None => TupleDesc::new(vec![Type::Int], vec!["aggValue".to_string()]),
            Some((_, gtype)) => TupleDesc::new(
                vec![gtype, Type::Int],
                vec!["groupValue".to_string(), "aggValue".to_string()],
            ),
        }
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        match tuple.field(self.afield) {
            Field::Text(_) => {}
            other => {
                return Err(DbError::InvalidOperation(format!(
                    "string aggregator applied to {} field",
                    other.field_type()
                )))
            }
        }
        let key = self.group_by.map(|(g, _)| tuple.field(g).clone());
        *self.counts.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn iterator(&self) -> TupleIterator {
        let desc = self.result_desc();
        let tuples: Vec<Tuple> = self
            .counts
            .iter()
            .map(|(key, count)| {
                let fields = match key {
                    None => vec![Field::Int(*count)],
                    Some(group) => vec![group.clone(), Field::Int(*count)],
                };
                Tuple::new(desc.clone(), fields)
            })
            .collect();
        TupleIterator::new(desc, tuples)
    }
}
