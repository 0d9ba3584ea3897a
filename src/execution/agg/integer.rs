use linked_hash_map::LinkedHashMap;

use crate::common::error::{DbError, DbResult};
use crate::execution::agg::{AggOp, Aggregator};
use crate::execution::tuple_iterator::TupleIterator;
use crate::storage::tuple::{Field, Tuple, TupleDesc, Type};

/// Group key: the group-by field's value, or `None` for the global group.
type GroupKey = Option<Field>;

/// Grouped aggregation over an integer column. SUM/COUNT/MIN/MAX keep a
/// single running i32 per group; AVG keeps (sum, count) and divides when
/// results are read. Groups iterate in first-seen order.
pub struct IntegerAggregator {
    group_by: Option<(usize, Type)>,
    afield: usize,
    op: AggOp,
    groups: LinkedHashMap<GroupKey, i32>,
    averages: LinkedHashMap<GroupKey, (i64, i32)>,
}

impl IntegerAggregator {
    pub fn new(group_by: Option<(usize, Type)>, afield: usize, op: AggOp) -> Self {
        IntegerAggregator {
            group_by,
            afield,
            op,
            groups: LinkedHashMap::new(),
            averages: LinkedHashMap::new(),
        }
    }

    fn group_key(&self, tuple: &Tuple) -> GroupKey {
        self.group_by.map(|(g, _)| tuple.field(g).clone())
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

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        let value = match tuple.field(self.afield) {
            Field::Int(v) => *v,
            other => {
                return Err(DbError::InvalidOperation(format!(
                    "integer aggregator applied to {} field",
                    other.field_type()
                )))
            }
        };
        let key = self.group_key(tuple);

        match self.op {
            AggOp::Sum => {
                *self.groups.entry(key).or_insert(0) += value;
            }
            AggOp::Count => {
                *self.groups.entry(key).or_insert(0) += 1;
            }
            AggOp::Min => {
                let entry = self.groups.entry(key).or_insert(value);
                *entry = (*entry).min(value);
            }
            AggOp::Max => {
                let entry = self.groups.entry(key).or_insert(value);
                *entry = (*entry).max(value);
            }
            AggOp::Avg => {
                let entry = self.averages.entry(key).or_insert((0, 0));
                entry.0 += value as i64;
                entry.1 += 1;
            }
        }
        Ok(())
    }

    fn iterator(&self) -> TupleIterator {
        let desc = self.result_desc();
        let make_tuple = |key: &GroupKey, value: i32| {
            let fields = match key {
                None => vec![Field::Int(value)],
                Some(group) => vec![group.clone(), Field::Int(value)],
            };
            Tuple::new(desc.clone(), fields)
        };

        let tuples: Vec<Tuple> = if self.op == AggOp::Avg {
            self.averages
                .iter()
                .map(|(key, (sum, count))| make_tuple(key, (*sum / *count as i64) as i32))
                .collect()
        } else {
            self.groups
                .iter()
                .map(|(key, value)| make_tuple(key, *value))
                .collect()
        };
        TupleIterator::new(desc, tuples)
    }
}
