//! Domain types shared by the cache, the pool and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// A persisted value together with its expiration time.
///
/// Entries are immutable once written; updating a key replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub expires_at: SystemTime,
}

impl CacheEntry {
    pub fn new(value: Vec<u8>, expires_at: SystemTime) -> Self {
        Self { value, expires_at }
    }

    /// Build an entry that expires `ttl` from now
    pub fn with_ttl(value: Vec<u8>, ttl: Duration) -> Self {
        let now = SystemTime::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        Self { value, expires_at }
    }

    /// An entry is valid iff `now < expires_at`
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(SystemTime::now())
    }

    /// Time left before the entry expires, zero once expired
    pub fn remaining_ttl(&self) -> Duration {
        self.expires_at
            .duration_since(SystemTime::now())
            .unwrap_or_default()
    }
}

/// Where a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Network,
    Cache,
}

/// The outcome of a successful fetch, tagged by the form it takes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes freshly returned by the fetcher
    Fetched(Vec<u8>),
    /// A still-valid entry served from the cache store
    Cached(CacheEntry),
    /// Structured data produced by the extraction pipeline
    Extracted(ScrapedData),
}

impl Payload {
    /// The raw bytes behind this payload, if it still carries them
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Fetched(bytes) => Some(bytes),
            Payload::Cached(entry) => Some(&entry.value),
            Payload::Extracted(_) => None,
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Payload::Fetched(_) => Origin::Network,
            Payload::Cached(_) => Origin::Cache,
            Payload::Extracted(data) => data.origin,
        }
    }
}

/// Structured view of one fetched resource after extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedData {
    pub url: String,
    pub origin: Origin,
    pub size: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// CSS selector results keyed by selector
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extracted: BTreeMap<String, Vec<String>>,

    /// Regex matches keyed by pattern
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matches: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_validity_boundary() {
        let now = SystemTime::now();
        let entry = CacheEntry::new(b"body".to_vec(), now);
        assert!(!entry.is_valid_at(now));
        assert!(entry.is_valid_at(now - Duration::from_millis(1)));
    }

    #[test]
    fn test_with_ttl_is_valid_until_expiry() {
        let entry = CacheEntry::with_ttl(b"body".to_vec(), Duration::from_secs(60));
        assert!(!entry.is_expired());
        assert!(entry.remaining_ttl() <= Duration::from_secs(60));

        let expired = CacheEntry::with_ttl(b"body".to_vec(), Duration::ZERO);
        assert!(expired.is_expired());
        assert_eq!(expired.remaining_ttl(), Duration::ZERO);
    }

    #[test]
    fn test_payload_bytes_and_origin() {
        let fetched = Payload::Fetched(b"abc".to_vec());
        assert_eq!(fetched.bytes(), Some(&b"abc"[..]));
        assert_eq!(fetched.origin(), Origin::Network);

        let cached = Payload::Cached(CacheEntry::with_ttl(b"xyz".to_vec(), Duration::from_secs(5)));
        assert_eq!(cached.bytes(), Some(&b"xyz"[..]));
        assert_eq!(cached.origin(), Origin::Cache);
    }
}
