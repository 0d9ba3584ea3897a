// Write-ahead log
//
// Append-only record stream consumed by the buffer pool: before a dirty
// page may overwrite its on-disk image, an update record carrying the
// before and after images must be on stable storage. Records are
// length-framed bincode. Replay/recovery is out of scope; the log exists
// so the write-ahead ordering is real and observable.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::page::PageId;
use crate::transaction::TransactionId;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log record: {0}")]
    Encode(String),

    #[error("failed to decode log record: {0}")]
    Decode(String),
}

pub type LogResult<T> = Result<T, LogError>;

/// One entry in the write-ahead log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogRecord {
    /// A page update: the images bracketing the change.
    Update {
        tid: u64,
        table_id: u32,
        page_no: u64,
        before: Vec<u8>,
        after: Vec<u8>,
    },
    Commit {
        tid: u64,
    },
    Abort {
        tid: u64,
    },
}

pub struct LogManager {
    file: Mutex<File>,
    path: PathBuf,
    next_lsn: AtomicU64,
}

impl LogManager {
    /// Open (or create) the log file at `path`.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path.as_ref())?;
        Ok(LogManager {
            file: Mutex::new(file),
            path: path.as_ref().to_path_buf(),
            next_lsn: AtomicU64::new(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &LogRecord) -> LogResult<u64> {
        let body = bincode::serialize(record).map_err(|e| LogError::Encode(e.to_string()))?;
        let mut file = self.file.lock();
        file.write_u32::<LittleEndian>(body.len() as u32)?;
        file.write_all(&body)?;
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);
        log::debug!("wal: appended record lsn={}", lsn);
        Ok(lsn)
    }

    /// Append an update record for a page about to be flushed.
    pub fn log_write(
        &self,
        tid: TransactionId,
        pid: PageId,
        before: &[u8],
        after: &[u8],
    ) -> LogResult<u64> {
        self.append(&LogRecord::Update {
            tid: tid.id(),
            table_id: pid.table_id,
            page_no: pid.page_no as u64,
            before: before.to_vec(),
            after: after.to_vec(),
        })
    }

    pub fn log_commit(&self, tid: TransactionId) -> LogResult<u64> {
        self.append(&LogRecord::Commit { tid: tid.id() })
    }

    pub fn log_abort(&self, tid: TransactionId) -> LogResult<u64> {
        self.append(&LogRecord::Abort { tid: tid.id() })
    }

    /// Flush buffered records and fsync the log file.
    pub fn force(&self) -> LogResult<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Read every record currently in the log, in append order.
    pub fn records(&self) -> LogResult<Vec<LogRecord>> {
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let mut data = Vec::with_capacity(len as usize);
        {
            use std::io::Seek;
            file.seek(std::io::SeekFrom::Start(0))?;
            file.read_to_end(&mut data)?;
        }
        drop(file);

        let mut records = Vec::new();
        let mut cursor = std::io::Cursor::new(data.as_slice());
        while (cursor.position() as usize) < data.len() {
            let frame_len = cursor.read_u32::<LittleEndian>()? as usize;
            let start = cursor.position() as usize;
            let end = start + frame_len;
            if end > data.len() {
                return Err(LogError::Decode("truncated log record".to_string()));
            }
            let record = bincode::deserialize(&data[start..end])
                .map_err(|e| LogError::Decode(e.to_string()))?;
            records.push(record);
            cursor.set_position(end as u64);
        }
        Ok(records)
    }
}
