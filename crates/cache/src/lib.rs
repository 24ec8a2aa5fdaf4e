//! Cache store for porygo
//!
//! This crate provides the persistent key→entry map that lets repeated runs
//! skip fetches whose results are still fresh:
//! - [`CacheStorage`], the store contract shared by every backend
//! - [`FileStore`], a single-file store with an exclusive process lock and
//!   synchronous, crash-safe writes
//! - a versioned, checksummed record format independent of any in-memory
//!   representation
//! - [`DisabledStore`], the stand-in used when no store can be opened
//! - [`CacheManager`], which owns the one open store of a process
//! - [`CacheStats`] for inspecting what is on disk

pub mod errors;
pub mod manager;
pub mod storage;
pub mod traits;

pub use errors::{CacheError, RecoveryHint, Result};
pub use manager::{inspect, CacheListing, CacheManager, CacheStats, EntryState};
pub use porygo_core::CacheEntry;
pub use storage::{DisabledStore, FileStore};
pub use traits::CacheStorage;
