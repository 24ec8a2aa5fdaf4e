//! Inspection of what the cache file currently holds

use crate::errors::Result;
use crate::storage::{decode_entry, FileStore};
use crate::traits::CacheStorage;
use std::path::PathBuf;
use std::time::SystemTime;

/// Health of a single stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Valid,
    Expired,
    Corrupt,
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryState::Valid => write!(f, "valid"),
            EntryState::Expired => write!(f, "expired"),
            EntryState::Corrupt => write!(f, "corrupt"),
        }
    }
}

/// One row of `porygo cache list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheListing {
    pub key: String,
    pub state: EntryState,
    /// Unknown for corrupt records
    pub expires_at: Option<SystemTime>,
    /// Payload size, or the raw record size when the record is corrupt
    pub size: usize,
}

/// Aggregate figures for `porygo cache stats`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub path: PathBuf,
    pub entries: usize,
    pub valid: usize,
    pub expired: usize,
    pub corrupt: usize,
    pub payload_bytes: u64,
    pub file_size: u64,
}

impl CacheStats {
    pub fn collect(store: &FileStore) -> Result<Self> {
        let mut stats = CacheStats {
            path: store.path().to_path_buf(),
            file_size: store.file_size()?,
            ..Default::default()
        };

        for listing in inspect(store, SystemTime::now())? {
            stats.entries += 1;
            match listing.state {
                EntryState::Valid => stats.valid += 1,
                EntryState::Expired => stats.expired += 1,
                EntryState::Corrupt => stats.corrupt += 1,
            }
            if listing.state != EntryState::Corrupt {
                stats.payload_bytes += listing.size as u64;
            }
        }

        Ok(stats)
    }

    /// Share of stored entries that are still servable, in percent
    pub fn valid_ratio(&self) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            (self.valid as f64 / self.entries as f64) * 100.0
        }
    }
}

/// Classify every record as of `now`, in key order
pub fn inspect(store: &FileStore, now: SystemTime) -> Result<Vec<CacheListing>> {
    let mut listings = Vec::new();
    for key in store.keys()? {
        let Some(raw) = store.raw(&key)? else {
            continue;
        };
        let listing = match decode_entry(&key, &raw) {
            Ok(entry) => CacheListing {
                state: if entry.is_valid_at(now) {
                    EntryState::Valid
                } else {
                    EntryState::Expired
                },
                expires_at: Some(entry.expires_at),
                size: entry.value.len(),
                key,
            },
            Err(_) => CacheListing {
                state: EntryState::Corrupt,
                expires_at: None,
                size: raw.len(),
                key,
            },
        };
        listings.push(listing);
    }
    Ok(listings)
}
