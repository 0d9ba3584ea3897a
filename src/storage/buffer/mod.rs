// Buffer pool
//
// A bounded PageId -> page cache with LRU replacement, integrated page
// locking, and no-steal transaction semantics: dirty pages never reach
// disk before their transaction commits, and an aborting transaction's
// pages are restored from their on-disk images.

pub mod lock_manager;

pub use lock_manager::LockManager;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::error::{DbError, DbResult};
use crate::storage::page::{HeapPage, PageId};
use crate::storage::tuple::Tuple;
use crate::transaction::wal::LogManager;
use crate::transaction::{Permissions, TransactionId};

/// Shared handle to a cached page. Readers take the page read lock,
/// writers the write lock; the owning transaction must hold the matching
/// page-level lock first.
pub type PagePtr = Arc<RwLock<HeapPage>>;

/// How long a transaction may wait for a page lock before it is aborted.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(1);

struct PoolInner {
    pages: HashMap<PageId, PagePtr>,
    /// Recency order over the cached page ids; front is most recent.
    recency: VecDeque<PageId>,
}

impl PoolInner {
    fn touch(&mut self, pid: PageId) {
        if let Some(pos) = self.recency.iter().position(|p| *p == pid) {
            self.recency.remove(pos);
        }
        self.recency.push_front(pid);
    }

    fn remove(&mut self, pid: PageId) {
        self.pages.remove(&pid);
        if let Some(pos) = self.recency.iter().position(|p| *p == pid) {
            self.recency.remove(pos);
        }
    }
}

pub struct BufferPool {
    capacity: usize,
    lock_timeout: Duration,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    log: Arc<LogManager>,
    inner: Mutex<PoolInner>,
    /// Set when a log write fails during flush; commits are refused from
    /// then on because the write-ahead guarantee is gone.
    poisoned: AtomicBool,
}

impl BufferPool {
    pub fn new(capacity: usize, catalog: Arc<Catalog>, log: Arc<LogManager>) -> Self {
        BufferPool {
            capacity,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_manager: LockManager::new(),
            catalog,
            log,
            inner: Mutex::new(PoolInner {
                pages: HashMap::new(),
                recency: VecDeque::new(),
            }),
            poisoned: AtomicBool::new(false),
        }
    }

    /// Override the lock-wait deadline. Tests only.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Fetch a page with the requested access mode, blocking until the
    /// page lock is granted or the deadline passes. A timeout aborts the
    /// requesting transaction; the caller must roll it back.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> DbResult<PagePtr> {
        let deadline = Instant::now() + self.lock_timeout;
        while !self.lock_manager.acquire(pid, tid, perm) {
            if Instant::now() >= deadline {
                log::warn!("{} timed out waiting for {:?} on page {}", tid, perm, pid);
                return Err(DbError::TransactionAborted);
            }
            std::thread::sleep(LOCK_RETRY_INTERVAL);
        }

        let mut inner = self.inner.lock();
        if let Some(ptr) = inner.pages.get(&pid).cloned() {
            inner.touch(pid);
            return Ok(ptr);
        }

        while inner.pages.len() >= self.capacity {
            self.evict_locked(&mut inner)?;
        }

        let file = self.catalog.database_file(pid.table_id)?;
        let page = file.read_page(pid)?;
        let ptr = Arc::new(RwLock::new(page));
        inner.pages.insert(pid, ptr.clone());
        inner.recency.push_front(pid);
        Ok(ptr)
    }

    /// Evict the least recently used clean page. Dirty pages are never
    /// eviction victims (no-steal); if everything is dirty the cache
    /// cannot make room.
    fn evict_locked(&self, inner: &mut PoolInner) -> DbResult<()> {
        let victim = inner.recency.iter().rev().copied().find(|pid| {
            inner
                .pages
                .get(pid)
                .map(|ptr| ptr.read().dirtier().is_none())
                .unwrap_or(false)
        });
        match victim {
            Some(pid) => {
                log::debug!("evicting clean page {}", pid);
                inner.remove(pid);
                Ok(())
            }
            None => Err(DbError::AllPagesDirty),
        }
    }

    /// Release a single page lock early. Breaks strict two-phase locking;
    /// only the heap-file insert probe may use it, on pages it did not
    /// modify.
    pub fn unsafe_release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(pid, tid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds(pid, tid)
    }

    /// Insert a tuple into `table_id`, adopting every page the heap file
    /// touched: each is marked dirty and (re-)installed at the recency
    /// front, including pages freshly allocated outside the cache.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: u32, tuple: Tuple) -> DbResult<()> {
        let file = self.catalog.database_file(table_id)?;
        let pages = file.insert_tuple(tid, &tuple, self)?;
        self.adopt_dirty(tid, pages);
        Ok(())
    }

    /// Delete the tuple referenced by its record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::InvalidOperation("tuple has no record id".to_string()))?;
        let file = self.catalog.database_file(rid.page_id.table_id)?;
        let pages = file.delete_tuple(tid, tuple, self)?;
        self.adopt_dirty(tid, pages);
        Ok(())
    }

    fn adopt_dirty(&self, tid: TransactionId, pages: Vec<PagePtr>) {
        let mut inner = self.inner.lock();
        for ptr in pages {
            let pid = {
                let mut page = ptr.write();
                page.mark_dirty(Some(tid));
                page.id()
            };
            inner.pages.insert(pid, ptr);
            inner.touch(pid);
        }
    }

    /// Flush one page if dirty: log its before/after images, force the
    /// log, then write the data page (write-ahead order) and clear the
    /// dirtier. Unknown pages are ignored.
    pub fn flush_page(&self, pid: PageId) -> DbResult<()> {
        let ptr = match self.inner.lock().pages.get(&pid) {
            Some(ptr) => ptr.clone(),
            None => return Ok(()),
        };
        let mut page = ptr.write();
        if let Some(dirtier) = page.dirtier() {
            let after = page.page_data();
            let logged = self
                .log
                .log_write(dirtier, pid, page.before_image(), &after)
                .and_then(|_| self.log.force());
            if let Err(e) = logged {
                self.poisoned.store(true, Ordering::Release);
                log::warn!("log failure while flushing {}; refusing further commits", pid);
                return Err(e.into());
            }
            let file = self.catalog.database_file(pid.table_id)?;
            file.write_page(&page)?;
            page.mark_dirty(None);
        }
        Ok(())
    }

    /// Flush every dirty page. Breaks no-steal if uncommitted
    /// transactions hold dirty pages; intended for orderly shutdown.
    pub fn flush_all_pages(&self) -> DbResult<()> {
        let pids: Vec<PageId> = self.inner.lock().pages.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Commit-time flush for one transaction. Every cached page gets a
    /// fresh before-image snapshot (the rollback baseline going forward),
    /// then the transaction's dirty pages are flushed.
    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        let entries: Vec<(PageId, PagePtr)> = {
            let inner = self.inner.lock();
            inner
                .recency
                .iter()
                .filter_map(|pid| inner.pages.get(pid).map(|ptr| (*pid, ptr.clone())))
                .collect()
        };
        for (pid, ptr) in entries {
            let dirtier = {
                let mut page = ptr.write();
                page.set_before_image();
                page.dirtier()
            };
            if dirtier == Some(tid) {
                self.flush_page(pid)?;
            }
        }
        Ok(())
    }

    /// Replace every page dirtied by `tid` with its on-disk image.
    pub fn restore_pages(&self, tid: TransactionId) -> DbResult<()> {
        let entries: Vec<(PageId, PagePtr)> = {
            let inner = self.inner.lock();
            inner
                .pages
                .iter()
                .filter(|(_, ptr)| ptr.read().dirtier() == Some(tid))
                .map(|(pid, ptr)| (*pid, ptr.clone()))
                .collect()
        };
        for (pid, ptr) in entries {
            let file = self.catalog.database_file(pid.table_id)?;
            let fresh = file.read_page(pid)?;
            *ptr.write() = fresh;
            let mut inner = self.inner.lock();
            if inner.pages.contains_key(&pid) {
                inner.touch(pid);
            }
            log::debug!("{} rolled back page {}", tid, pid);
        }
        Ok(())
    }

    /// Finish a transaction: flush its pages (commit) or restore them
    /// (abort), append the completion record, and release its locks.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        if commit {
            if self.poisoned.load(Ordering::Acquire) {
                return Err(DbError::InvalidOperation(
                    "log failure: commits are disabled".to_string(),
                ));
            }
            self.flush_pages(tid)?;
            self.log.log_commit(tid)?;
            self.log.force()?;
        } else {
            self.restore_pages(tid)?;
            self.log.log_abort(tid)?;
        }
        self.lock_manager.release_all(tid);
        Ok(())
    }

    /// Drop a page from the cache without flushing. Used when a cached
    /// image must not survive (rolled-back allocations, page reuse).
    pub fn discard_page(&self, pid: PageId) {
        self.inner.lock().remove(pid);
    }

    /// Number of pages currently cached.
    pub fn cached_page_count(&self) -> usize {
        let inner = self.inner.lock();
        debug_assert_eq!(inner.pages.len(), inner.recency.len());
        inner.pages.len()
    }

    /// Whether `pid` is resident in the cache.
    pub fn contains_page(&self, pid: PageId) -> bool {
        self.inner.lock().pages.contains_key(&pid)
    }
}
