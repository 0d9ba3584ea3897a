// Heap file storage
//
// A heap file is an unordered collection of fixed-size slotted pages in a
// single on-disk file, addressed by 0-based page number. All page access
// from query execution goes through the buffer pool; the raw read/write
// entry points here are the pool's backing store.

use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::vec::IntoIter;

use parking_lot::Mutex;

use crate::common::error::{DbError, DbResult};
use crate::common::types::page_size;
use crate::storage::buffer::{BufferPool, PagePtr};
use crate::storage::page::{HeapPage, PageId};
use crate::storage::tuple::{Tuple, TupleDesc};
use crate::transaction::{Permissions, TransactionId};

pub struct HeapFile {
    file: Mutex<File>,
    path: PathBuf,
    id: u32,
    desc: TupleDesc,
}

impl HeapFile {
    /// Open (or create) a heap file backed by `path`.
    pub fn open(path: impl AsRef<Path>, desc: TupleDesc) -> DbResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;
        let id = stable_table_id(&path);
        Ok(HeapFile {
            file: Mutex::new(file),
            path,
            id,
            desc,
        })
    }

    /// Table id: a stable hash of the canonical backing path.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    /// Number of whole pages currently on disk.
    pub fn num_pages(&self) -> DbResult<usize> {
        let file = self.file.lock();
        let len = file.metadata()?.len();
        Ok((len / page_size() as u64) as usize)
    }

    /// Read one page image from disk. Reading a page that was never
    /// written is an I/O error.
    pub fn read_page(&self, pid: PageId) -> DbResult<HeapPage> {
        let mut file = self.file.lock();
        let offset = (pid.page_no * page_size()) as u64;
        let len = file.metadata()?.len();
        if offset + page_size() as u64 > len {
            return Err(DbError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("page {} is beyond the end of the file", pid),
            )));
        }
        let mut data = vec![0u8; page_size()];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut data)?;
        drop(file);
        HeapPage::new(pid, &data, self.desc.clone())
    }

    /// Write a page image to disk, extending the file as needed.
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let data = page.page_data();
        let offset = (page.id().page_no * page_size()) as u64;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(())
    }

    /// Find room for `tuple`, probing existing pages under write locks.
    /// Full pages are released immediately so readers can continue; when
    /// every page is full a fresh page is allocated, filled, and written
    /// to disk. Returns the pages modified, for the pool to adopt.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        tuple: &Tuple,
        pool: &BufferPool,
    ) -> DbResult<Vec<PagePtr>> {
        for page_no in 0..self.num_pages()? {
            let pid = PageId::new(self.id, page_no);
            let ptr = pool.get_page(tid, pid, Permissions::ReadWrite)?;
            {
                let mut page = ptr.write();
                if page.empty_slot_count() > 0 {
                    page.insert_tuple(tuple.clone())?;
                    drop(page);
                    return Ok(vec![ptr]);
                }
            }
            pool.unsafe_release_page(tid, pid);
        }

        let pid = PageId::new(self.id, self.num_pages()?);
        let mut page = HeapPage::new(pid, &HeapPage::empty_page_data(), self.desc.clone())?;
        page.insert_tuple(tuple.clone())?;
        self.write_page(&page)?;
        log::debug!("{} allocated page {} for insert", tid, pid);
        Ok(vec![Arc::new(parking_lot::RwLock::new(page))])
    }

    /// Remove the tuple at its record id, under a write lock.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        tuple: &Tuple,
        pool: &BufferPool,
    ) -> DbResult<Vec<PagePtr>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::InvalidOperation("tuple has no record id".to_string()))?;
        let ptr = pool.get_page(tid, rid.page_id, Permissions::ReadWrite)?;
        ptr.write().delete_tuple(tuple)?;
        Ok(vec![ptr])
    }

    /// A restartable cursor over every tuple in the file. The page count
    /// is captured here: pages appended while the cursor is open are not
    /// visited.
    pub fn iterator(
        self: &Arc<Self>,
        tid: TransactionId,
        pool: Arc<BufferPool>,
    ) -> DbResult<HeapFileIterator> {
        Ok(HeapFileIterator {
            file: Arc::clone(self),
            pool,
            tid,
            page_count: self.num_pages()?,
            cur_page: 0,
            tuples: None,
        })
    }
}

fn stable_table_id(path: &Path) -> u32 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish() as u32
}

/// Cursor over a heap file's tuples, pulling pages through the buffer
/// pool with read locks.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    page_count: usize,
    cur_page: usize,
    tuples: Option<Peekable<IntoIter<Tuple>>>,
}

impl HeapFileIterator {
    fn load_page(&self, page_no: usize) -> DbResult<Peekable<IntoIter<Tuple>>> {
        let pid = PageId::new(self.file.id(), page_no);
        let ptr = self
            .pool
            .get_page(self.tid, pid, Permissions::ReadOnly)?;
        let page = ptr.read();
        let tuples: Vec<Tuple> = page.iter().cloned().collect();
        Ok(tuples.into_iter().peekable())
    }

    pub fn open(&mut self) -> DbResult<()> {
        self.cur_page = 0;
        self.tuples = if self.page_count > 0 {
            Some(self.load_page(0)?)
        } else {
            None
        };
        Ok(())
    }

    pub fn has_next(&mut self) -> DbResult<bool> {
        loop {
            match self.tuples.as_mut() {
                None => return Ok(false),
                Some(iter) => {
                    if iter.peek().is_some() {
                        return Ok(true);
                    }
                }
            }
            self.cur_page += 1;
            if self.cur_page >= self.page_count {
                return Ok(false);
            }
            self.tuples = Some(self.load_page(self.cur_page)?);
        }
    }

    pub fn next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::InvalidOperation(
                "next() on an exhausted iterator".to_string(),
            ));
        }
        match self.tuples.as_mut().and_then(|iter| iter.next()) {
            Some(tuple) => Ok(tuple),
            None => Err(DbError::InvalidOperation(
                "next() on an exhausted iterator".to_string(),
            )),
        }
    }

    pub fn rewind(&mut self) -> DbResult<()> {
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.tuples = None;
    }
}
