//! Display implementations for cache errors

use super::types::{CacheError, RecoveryHint};
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Corruption { key, reason, .. } if key.is_empty() => {
                write!(f, "Cache file corruption detected: {reason}")
            }
            Self::Corruption { key, reason, .. } => {
                write!(f, "Cache corruption detected for key '{key}': {reason}")
            }
            Self::Encoding { key, reason, .. } => {
                write!(f, "Failed to encode cache entry '{key}': {reason}")
            }
            Self::InvalidKey { key, reason, .. } => {
                write!(f, "Invalid cache key '{key}': {reason}")
            }
            Self::Locked {
                path,
                waited,
                reason,
                ..
            } => write!(
                f,
                "Cache file '{}' is in use (waited {waited:?}): {reason}",
                path.display()
            ),
            Self::Closed { .. } => write!(f, "Cache store is closed"),
        }
    }
}

impl fmt::Display for RecoveryHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry { after } => write!(f, "retry after {after:?}"),
            Self::ClearAndRetry => write!(f, "run `porygo cache clear` and retry"),
            Self::CheckPermissions { path } => {
                write!(f, "check permissions on '{}'", path.display())
            }
            Self::Reopen => write!(f, "reopen the cache"),
            Self::Manual { instructions } => write!(f, "{instructions}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
