// Database service bundle
//
// The catalog, log, and buffer pool are explicit services wired together
// here and shared by Arc. One Database per process (or per test); there
// is no global instance.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::common::error::DbResult;
use crate::common::types::DEFAULT_PAGES;
use crate::optimizer::table_stats::TableStats;
use crate::storage::buffer::BufferPool;
use crate::storage::heap_file::HeapFile;
use crate::storage::tuple::TupleDesc;
use crate::transaction::wal::LogManager;

pub struct Database {
    catalog: Arc<Catalog>,
    log: Arc<LogManager>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    /// Open a database with the given WAL path and buffer-pool capacity.
    pub fn open(log_path: impl AsRef<Path>, pool_capacity: usize) -> DbResult<Self> {
        let catalog = Arc::new(Catalog::new());
        let log = Arc::new(LogManager::open(log_path)?);
        let buffer_pool = Arc::new(BufferPool::new(
            pool_capacity,
            Arc::clone(&catalog),
            Arc::clone(&log),
        ));
        Ok(Database {
            catalog,
            log,
            buffer_pool,
        })
    }

    /// Open with the default buffer-pool capacity.
    pub fn open_default(log_path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open(log_path, DEFAULT_PAGES)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn log(&self) -> &Arc<LogManager> {
        &self.log
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Create (or open) a heap table backed by `path` and register it
    /// under `name`. Returns the table id.
    pub fn add_table(
        &self,
        path: impl AsRef<Path>,
        desc: TupleDesc,
        name: &str,
    ) -> DbResult<u32> {
        let file = Arc::new(HeapFile::open(path, desc)?);
        Ok(self.catalog.add_table(file, name))
    }

    /// Build statistics for every registered table, keyed by table name.
    pub fn compute_statistics(&self, io_cost_per_page: f64) -> DbResult<HashMap<String, TableStats>> {
        let mut stats = HashMap::new();
        for table_id in self.catalog.table_ids() {
            let name = self.catalog.table_name(table_id)?;
            stats.insert(
                name,
                TableStats::new(&self.buffer_pool, table_id, io_cost_per_page)?,
            );
        }
        Ok(stats)
    }
}
