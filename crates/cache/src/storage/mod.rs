//! Persistent single-file cache store
//!
//! The whole store lives in one file guarded by an exclusive process lock:
//! - readers share an in-memory snapshot of the encoded records
//! - one writer at a time appends a frame, syncs it, and only then publishes
//!   the next snapshot
//! - once superseded frames dominate, the file is compacted with an atomic
//!   replace
//! - record bodies stay encoded until looked up

mod disabled;
mod format;


pub use disabled::DisabledStore;
pub use format::{
    decode_entry, decode_file, decode_log, encode_entry, encode_file, encode_frame, file_header,
    DecodedLog, Records, FILE_MAGIC, FILE_VERSION, HEADER_LEN, RECORD_VERSION,
};

use crate::errors::{CacheError, RecoveryHint, Result};
use crate::traits::CacheStorage;
use parking_lot::{Mutex, RwLock};
use porygo_core::CacheEntry;
use porygo_utils::{write_atomic, ExclusiveFileLock, XdgPaths};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a second opener waits for the process lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Logs shorter than this are never compacted
const COMPACT_MIN_FRAMES: usize = 64;

/// Compact once the log holds this many frames per live key
const COMPACT_RATIO: usize = 2;

/// Shape of the on-disk log, owned by the writer
#[derive(Debug)]
struct LogState {
    frames: usize,
    /// Set after a failed append; the next write rewrites the whole file
    needs_rewrite: bool,
}

/// A [`CacheStorage`] backed by one local file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// `None` once closed
    snapshot: RwLock<Option<Arc<Records>>>,
    /// Serialises writes
    writer: Mutex<LogState>,
    lock: Mutex<Option<ExclusiveFileLock>>,
}

impl FileStore {
    /// Open the store at `path`, waiting up to [`DEFAULT_LOCK_TIMEOUT`] for
    /// another process to release it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open the store at the platform cache location
    pub fn open_default() -> Result<Self> {
        Self::open(XdgPaths::cache_file())
    }

    pub fn open_with_timeout(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self> {
        let path = path.into();
        let lock_path = XdgPaths::lock_file_for(&path);

        let lock = ExclusiveFileLock::acquire(&lock_path, lock_timeout).map_err(|e| {
            if e.kind() == io::ErrorKind::WouldBlock {
                CacheError::Locked {
                    path: path.clone(),
                    waited: lock_timeout,
                    reason: e.to_string(),
                    recovery_hint: RecoveryHint::Retry {
                        after: lock_timeout,
                    },
                }
            } else {
                CacheError::io(&lock_path, "acquire cache lock", e)
            }
        })?;

        let (records, frames) = match std::fs::read(&path) {
            Ok(bytes) => {
                let log = decode_log(&bytes)?;
                if log.clean_len < bytes.len() {
                    warn!(
                        path = %path.display(),
                        discarded = bytes.len() - log.clean_len,
                        "dropping incomplete frame at the end of the cache file"
                    );
                    write_atomic(&path, &encode_file(&log.records)?)?;
                    let live = log.records.len();
                    (log.records, live)
                } else {
                    (log.records, log.frames)
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                write_atomic(&path, &file_header())?;
                info!(path = %path.display(), "created cache file");
                (Records::new(), 0)
            }
            Err(e) => return Err(CacheError::io(&path, "read cache file", e)),
        };

        debug!(
            path = %path.display(),
            entries = records.len(),
            frames,
            "opened cache store"
        );

        Ok(Self {
            path,
            snapshot: RwLock::new(Some(Arc::new(records))),
            writer: Mutex::new(LogState {
                frames,
                needs_rewrite: false,
            }),
            lock: Mutex::new(Some(lock)),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.snapshot.read().is_none()
    }

    /// Size of the backing file in bytes
    pub fn file_size(&self) -> Result<u64> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| CacheError::io(&self.path, "stat cache file", e))
    }

    /// Raw encoded body of `key`, used to inspect records without decoding them
    pub(crate) fn raw(&self, key: &str) -> Result<Option<Arc<[u8]>>> {
        Ok(self.current()?.get(key).cloned())
    }

    /// Frames currently in the backing file, superseded ones included
    pub fn frame_count(&self) -> usize {
        self.writer.lock().frames
    }

    fn current(&self) -> Result<Arc<Records>> {
        self.snapshot.read().clone().ok_or_else(CacheError::closed)
    }

    /// Record `body` for `key`, or remove it when `body` is `None`.
    ///
    /// The change is durable before the new snapshot is published. Bodies are
    /// shared with the previous snapshot, so only the key table is copied.
    fn write_frame(&self, key: &str, body: Option<Arc<[u8]>>) -> Result<()> {
        let mut log = self.writer.lock();

        let current = self.current()?;
        if body.is_none() && !current.contains_key(key) {
            return Ok(());
        }

        let mut next = Records::clone(&current);
        match &body {
            Some(body) => {
                next.insert(key.to_string(), Arc::clone(body));
            }
            None => {
                next.remove(key);
            }
        }

        let frames = log.frames + 1;
        if log.needs_rewrite
            || (frames >= COMPACT_MIN_FRAMES && frames > next.len() * COMPACT_RATIO)
        {
            self.rewrite(&mut log, &next)?;
        } else {
            let frame = encode_frame(key, body.as_deref())?;
            if let Err(e) = self.append(&frame) {
                log.needs_rewrite = true;
                return Err(e);
            }
            log.frames = frames;
        }

        self.publish(next)
    }

    /// Replace the file with one frame per live key
    fn rewrite(&self, log: &mut LogState, records: &Records) -> Result<()> {
        let superseded = log.frames.saturating_sub(records.len());
        write_atomic(&self.path, &encode_file(records)?)?;
        log.frames = records.len();
        log.needs_rewrite = false;
        debug!(
            path = %self.path.display(),
            entries = records.len(),
            superseded,
            "compacted cache file"
        );
        Ok(())
    }

    fn append(&self, frame: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| CacheError::io(&self.path, "open cache file for append", e))?;
        file.write_all(frame)
            .map_err(|e| CacheError::io(&self.path, "append to cache file", e))?;
        file.sync_data()
            .map_err(|e| CacheError::io(&self.path, "sync cache file", e))
    }

    fn publish(&self, next: Records) -> Result<()> {
        let mut snapshot = self.snapshot.write();
        if snapshot.is_none() {
            return Err(CacheError::closed());
        }
        *snapshot = Some(Arc::new(next));
        Ok(())
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_key(key, "key must not be empty"));
    }
    Ok(())
}

impl CacheStorage for FileStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        check_key(key)?;
        match self.current()?.get(key) {
            Some(body) => decode_entry(key, body).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        check_key(key)?;
        let body = encode_entry(key, entry)?;
        self.write_frame(key, Some(Arc::from(body)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        self.write_frame(key, None)
    }

    fn clear(&self) -> Result<()> {
        let mut log = self.writer.lock();
        self.current()?;
        let empty = Records::new();
        self.rewrite(&mut log, &empty)?;
        self.publish(empty)
    }

    fn close(&self) -> Result<()> {
        let _writer = self.writer.lock();
        if self.snapshot.write().take().is_some() {
            self.lock.lock().take();
            debug!(path = %self.path.display(), "closed cache store");
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.current()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.current()?.len())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Releases the process lock
        let _ = self.close();
    }
}
