use thiserror::Error;

use crate::storage::page::PageError;
use crate::transaction::wal::LogError;

/// Crate-wide error type. Three kinds of failure flow through here:
/// transaction aborts (which callers must roll back), structural errors,
/// and I/O errors surfaced from the storage layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("transaction aborted")]
    TransactionAborted,

    #[error("all pages are dirty")]
    AllPagesDirty,

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("no such table: {0}")]
    TableNotFound(u32),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("page error: {0}")]
    Page(#[from] PageError),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
