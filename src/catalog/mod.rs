// Catalog: table registry
//
// Maps table ids to their heap files and human names. The catalog is an
// explicit service: it is created once per database instance and handed
// around by Arc, never through a process-wide global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::error::{DbError, DbResult};
use crate::storage::heap_file::HeapFile;
use crate::storage::tuple::TupleDesc;

#[derive(Default)]
struct CatalogInner {
    files: HashMap<u32, Arc<HeapFile>>,
    ids_by_name: HashMap<String, u32>,
    names_by_id: HashMap<u32, String>,
}

#[derive(Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Register a table under `name`. Re-registering a name replaces the
    /// old binding. Returns the table id.
    pub fn add_table(&self, file: Arc<HeapFile>, name: &str) -> u32 {
        let id = file.id();
        let mut inner = self.inner.write();
        if let Some(old_id) = inner.ids_by_name.insert(name.to_string(), id) {
            inner.files.remove(&old_id);
            inner.names_by_id.remove(&old_id);
        }
        inner.names_by_id.insert(id, name.to_string());
        inner.files.insert(id, file);
        id
    }

    /// The heap file backing `table_id`.
    pub fn database_file(&self, table_id: u32) -> DbResult<Arc<HeapFile>> {
        self.inner
            .read()
            .files
            .get(&table_id)
            .cloned()
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn table_name(&self, table_id: u32) -> DbResult<String> {
        self.inner
            .read()
            .names_by_id
            .get(&table_id)
            .cloned()
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn table_id(&self, name: &str) -> Option<u32> {
        self.inner.read().ids_by_name.get(name).copied()
    }

    pub fn tuple_desc(&self, table_id: u32) -> DbResult<TupleDesc> {
        Ok(self.database_file(table_id)?.desc().clone())
    }

    /// Ids of every registered table.
    pub fn table_ids(&self) -> Vec<u32> {
        self.inner.read().files.keys().copied().collect()
    }
}
