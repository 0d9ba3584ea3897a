// Transaction module exports

pub mod wal;

use std::sync::atomic::{AtomicU64, Ordering};

pub use wal::{LogError, LogManager, LogRecord};

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a running transaction. Ids are allocated from a
/// process-wide counter and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocate a fresh transaction id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Access mode requested on a page. Doubles as the lock mode held in the
/// lock table: `ReadOnly` maps to a shared lock, `ReadWrite` to exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}
