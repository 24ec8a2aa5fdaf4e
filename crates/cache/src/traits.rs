//! The store contract shared by every cache backend

use crate::errors::Result;
use porygo_core::CacheEntry;

/// A persistent key→entry map with explicit expiration.
///
/// Keys are opaque resource identifiers and values are opaque bytes; the
/// store never interprets either. Every mutating call is durable once it
/// returns `Ok`. Implementations must be safe to share between executors.
pub trait CacheStorage: Send + Sync {
    /// Point lookup. `Ok(None)` means not found; a record that cannot be
    /// decoded is reported as [`CacheError::Corruption`](crate::CacheError::Corruption).
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry for `key`
    fn set(&self, key: &str, entry: &CacheEntry) -> Result<()>;

    /// Remove `key`; removing an absent key succeeds
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every entry at once
    fn clear(&self) -> Result<()>;

    /// Release the underlying resources. Calling it again is a no-op.
    fn close(&self) -> Result<()>;

    /// All stored keys in sorted order
    fn keys(&self) -> Result<Vec<String>>;

    fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
