//! Ownership-scoped access to the process's single cache store
//!
//! The composition root creates one [`CacheManager`] and hands the store it
//! yields to every collaborator by reference. There is no global instance.

mod statistics;

pub use statistics::{inspect, CacheListing, CacheStats, EntryState};

use crate::errors::Result;
use crate::storage::{FileStore, DEFAULT_LOCK_TIMEOUT};
use crate::traits::CacheStorage;
use parking_lot::RwLock;
use porygo_utils::XdgPaths;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Factory that keeps at most one open [`FileStore`]
#[derive(Debug)]
pub struct CacheManager {
    path: PathBuf,
    lock_timeout: Duration,
    store: RwLock<Option<Arc<FileStore>>>,
}

impl CacheManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            store: RwLock::new(None),
        }
    }

    /// Manager for the platform cache file
    pub fn with_default_path() -> Self {
        Self::new(XdgPaths::cache_file())
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.store.read().is_some()
    }

    /// The open store, opening it on first use
    pub fn get_or_create(&self) -> Result<Arc<FileStore>> {
        if let Some(store) = self.store.read().as_ref() {
            return Ok(Arc::clone(store));
        }

        let mut slot = self.store.write();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(FileStore::open_with_timeout(&self.path, self.lock_timeout)?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Close the current store and forget it.
    ///
    /// Handles still held elsewhere observe a closed store; the next
    /// [`get_or_create`](Self::get_or_create) opens a fresh one.
    pub fn close(&self) -> Result<()> {
        let store = self.store.write().take();
        if let Some(store) = store {
            store.close()?;
            debug!(path = %self.path.display(), "cache manager released store");
        }
        Ok(())
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
