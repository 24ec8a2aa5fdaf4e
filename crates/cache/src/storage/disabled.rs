use crate::errors::Result;
use crate::traits::CacheStorage;
use porygo_core::CacheEntry;

/// A store that remembers nothing.
///
/// Stands in when the real store cannot be opened, so every lookup misses and
/// every write is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl CacheStorage for DisabledStore {
    fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _entry: &CacheEntry) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
