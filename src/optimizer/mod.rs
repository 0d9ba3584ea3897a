// Optimizer statistics
//
// Per-column equi-width histograms and per-table statistics used for
// scan-cost and selectivity estimation.

pub mod int_histogram;
pub mod string_histogram;
pub mod table_stats;

pub use int_histogram::IntHistogram;
pub use string_histogram::StringHistogram;
pub use table_stats::{TableStats, NUM_HIST_BINS};
