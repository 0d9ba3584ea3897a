// Page-level lock manager
//
// Shared/exclusive locks keyed by page id. All operations are
// non-blocking: `acquire` reports whether the lock was granted and the
// buffer pool implements waiting as a poll-with-deadline loop around it.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::storage::page::PageId;
use crate::transaction::{Permissions, TransactionId};

#[derive(Debug, Clone, Copy)]
struct Lock {
    tid: TransactionId,
    perm: Permissions,
}

#[derive(Debug, Default)]
pub struct LockManager {
    table: Mutex<HashMap<PageId, Vec<Lock>>>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager::default()
    }

    /// Try to take (or upgrade to) a lock on `pid` for `tid`. Returns
    /// false when a conflicting holder exists; never blocks.
    pub fn acquire(&self, pid: PageId, tid: TransactionId, perm: Permissions) -> bool {
        let mut table = self.table.lock();
        let holders = match table.get_mut(&pid) {
            None => {
                table.insert(pid, vec![Lock { tid, perm }]);
                return true;
            }
            Some(holders) => holders,
        };

        match perm {
            Permissions::ReadWrite => {
                // Exclusive: only grantable when tid is the sole holder,
                // upgrading a shared lock in place.
                if holders.len() == 1 && holders[0].tid == tid {
                    holders[0].perm = Permissions::ReadWrite;
                    true
                } else {
                    false
                }
            }
            Permissions::ReadOnly => {
                for lock in holders.iter() {
                    if lock.perm == Permissions::ReadWrite {
                        // An exclusive holder excludes everyone else; the
                        // holder itself keeps its stronger lock.
                        return lock.tid == tid && holders.len() == 1;
                    }
                    if lock.tid == tid {
                        return true;
                    }
                }
                holders.push(Lock {
                    tid,
                    perm: Permissions::ReadOnly,
                });
                true
            }
        }
    }

    /// Drop tid's lock on `pid`, if any.
    pub fn release(&self, pid: PageId, tid: TransactionId) {
        let mut table = self.table.lock();
        if let Some(holders) = table.get_mut(&pid) {
            holders.retain(|lock| lock.tid != tid);
            if holders.is_empty() {
                table.remove(&pid);
            }
        }
    }

    /// Drop every lock held by `tid`.
    pub fn release_all(&self, tid: TransactionId) {
        let mut table = self.table.lock();
        table.retain(|_, holders| {
            holders.retain(|lock| lock.tid != tid);
            !holders.is_empty()
        });
    }

    pub fn holds(&self, pid: PageId, tid: TransactionId) -> bool {
        let table = self.table.lock();
        table
            .get(&pid)
            .map(|holders| holders.iter().any(|lock| lock.tid == tid))
            .unwrap_or(false)
    }
}
