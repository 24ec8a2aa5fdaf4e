//! Core error types for the cache store

use std::path::PathBuf;
use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors during cache operations
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// A stored record or the file framing could not be decoded
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// An entry could not be encoded
    Encoding {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Invalid cache key
    InvalidKey {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Another process holds the cache file
    Locked {
        path: PathBuf,
        waited: Duration,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// The store was closed
    Closed { recovery_hint: RecoveryHint },
}

/// Recovery hints for error handling
#[derive(Debug, Clone)]
pub enum RecoveryHint {
    /// Retry the operation after a delay
    Retry { after: Duration },

    /// Clear the cache and retry
    ClearAndRetry,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Reopen the store through the cache manager
    Reopen,

    /// No automated recovery possible
    Manual { instructions: String },
}

impl CacheError {
    pub fn corruption(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corruption {
            key: key.into(),
            reason: reason.into(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Use a non-empty resource identifier as the key".to_string(),
            },
        }
    }

    pub fn closed() -> Self {
        Self::Closed {
            recovery_hint: RecoveryHint::Reopen,
        }
    }

    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        Self::Io {
            recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
            path,
            operation,
            source,
        }
    }

    /// True when a stored record could not be read back
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }

    pub fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::Encoding { recovery_hint, .. }
            | Self::InvalidKey { recovery_hint, .. }
            | Self::Locked { recovery_hint, .. }
            | Self::Closed { recovery_hint } => recovery_hint,
        }
    }
}
