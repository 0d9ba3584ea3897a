use std::collections::HashMap;
use std::sync::Arc;

use crate::common::error::{DbError, DbResult};
use crate::execution::predicate::PredOp;
use crate::execution::seq_scan::SeqScan;
use crate::execution::OpIterator;
use crate::optimizer::int_histogram::IntHistogram;
use crate::optimizer::string_histogram::StringHistogram;
use crate::storage::buffer::BufferPool;
use crate::storage::tuple::{Field, TupleDesc, Type};
use crate::transaction::TransactionId;

/// Buckets per column histogram.
pub const NUM_HIST_BINS: usize = 100;

/// Statistics over one base table: tuple count, page count, and one
/// histogram per column, built from two sequential scans (min/max first,
/// population second).
pub struct TableStats {
    table_id: u32,
    io_cost_per_page: f64,
    num_tuples: usize,
    num_pages: usize,
    desc: TupleDesc,
    int_hists: HashMap<usize, IntHistogram>,
    string_hists: HashMap<usize, StringHistogram>,
}

impl TableStats {
    pub fn new(pool: &Arc<BufferPool>, table_id: u32, io_cost_per_page: f64) -> DbResult<Self> {
        let file = pool.catalog().database_file(table_id)?;
        let desc = file.desc().clone();
        let num_fields = desc.num_fields();
        let num_pages = file.num_pages()?;

        let tid = TransactionId::new();
        let mut scan = SeqScan::new(Arc::clone(pool), tid, table_id, "stats");

        // Pass 1: per-column min/max for integer columns, tuple count.
        let mut mins = vec![i32::MAX; num_fields];
        let mut maxs = vec![i32::MIN; num_fields];
        let mut num_tuples = 0usize;

        scan.open()?;
        while scan.has_next()? {
            let tuple = scan.next()?;
            for i in 0..num_fields {
                if let Field::Int(v) = tuple.field(i) {
                    mins[i] = mins[i].min(*v);
                    maxs[i] = maxs[i].max(*v);
                }
            }
            num_tuples += 1;
        }

        let mut int_hists = HashMap::new();
        let mut string_hists = HashMap::new();
        for i in 0..num_fields {
            match desc.field_type(i) {
                Type::Int => {
                    // An empty table leaves min/max untouched; collapse
                    // to a single-point domain.
                    let (lo, hi) = if mins[i] > maxs[i] {
                        (0, 0)
                    } else {
                        (mins[i], maxs[i])
                    };
                    int_hists.insert(i, IntHistogram::new(NUM_HIST_BINS, lo, hi));
                }
                Type::Text => {
                    string_hists.insert(i, StringHistogram::new(NUM_HIST_BINS));
                }
            }
        }

        // Pass 2: populate the histograms.
        scan.rewind()?;
        while scan.has_next()? {
            let tuple = scan.next()?;
            for i in 0..num_fields {
                match tuple.field(i) {
                    Field::Int(v) => {
                        if let Some(h) = int_hists.get_mut(&i) {
                            h.add_value(*v);
                        }
                    }
                    Field::Text(s) => {
                        if let Some(h) = string_hists.get_mut(&i) {
                            h.add_value(s);
                        }
                    }
                }
            }
        }
        scan.close();
        pool.transaction_complete(tid, true)?;
        log::debug!(
            "built stats for table {}: {} tuples over {} pages",
            table_id,
            num_tuples,
            num_pages
        );

        Ok(TableStats {
            table_id,
            io_cost_per_page,
            num_tuples,
            num_pages,
            desc,
            int_hists,
            string_hists,
        })
    }

    pub fn table_id(&self) -> u32 {
        self.table_id
    }

    /// Cost of a full sequential scan, in I/O units: partial pages read
    /// like full ones.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.num_pages as f64 * self.io_cost_per_page
    }

    /// Tuples surviving a predicate with the given selectivity.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> usize {
        (self.num_tuples as f64 * selectivity) as usize
    }

    /// Selectivity of `field op constant` on this table.
    pub fn estimate_selectivity(&self, field: usize, op: PredOp, constant: &Field) -> DbResult<f64> {
        match (self.desc.field_type(field), constant) {
            (Type::Int, Field::Int(v)) => {
                let hist = self
                    .int_hists
                    .get(&field)
                    .ok_or_else(|| DbError::InvalidOperation(format!("no histogram for field {}", field)))?;
                Ok(hist.estimate_selectivity(op, *v))
            }
            (Type::Text, Field::Text(s)) => {
                let hist = self
                    .string_hists
                    .get(&field)
                    .ok_or_else(|| DbError::InvalidOperation(format!("no histogram for field {}", field)))?;
                Ok(hist.estimate_selectivity(op, s))
            }
            (expected, actual) => Err(DbError::InvalidOperation(format!(
                "field {} is {} but constant is {}",
                field,
                expected,
                actual.field_type()
            ))),
        }
    }

    /// Expected selectivity of the field under `op` with an unknown
    /// operand.
    pub fn avg_selectivity(&self, field: usize, _op: PredOp) -> DbResult<f64> {
        match self.desc.field_type(field) {
            Type::Int => self
                .int_hists
                .get(&field)
                .map(|h| h.avg_selectivity())
                .ok_or_else(|| DbError::InvalidOperation(format!("no histogram for field {}", field))),
            Type::Text => self
                .string_hists
                .get(&field)
                .map(|h| h.avg_selectivity())
                .ok_or_else(|| DbError::InvalidOperation(format!("no histogram for field {}", field))),
        }
    }

    pub fn total_tuples(&self) -> usize {
        self.num_tuples
    }
}
