//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};
use std::path::PathBuf;
use std::time::Duration;

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let recovery_hint = match error.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => RecoveryHint::Retry {
                after: Duration::from_millis(100),
            },
            _ => RecoveryHint::CheckPermissions {
                path: PathBuf::from("."),
            },
        };

        Self::Io {
            path: PathBuf::from("."),
            operation: "unknown",
            source: error,
            recovery_hint,
        }
    }
}

/// Core errors report cache failures as plain messages
impl From<CacheError> for porygo_core::Error {
    fn from(error: CacheError) -> Self {
        porygo_core::Error::cache(error.to_string())
    }
}

/// Only I/O failures can come back from the shared filesystem helpers
impl From<porygo_core::Error> for CacheError {
    fn from(error: porygo_core::Error) -> Self {
        match error {
            porygo_core::Error::FileSystem {
                path,
                operation,
                source,
            } => Self::Io {
                recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                path,
                operation: static_operation(&operation),
                source,
            },
            other => Self::Io {
                path: PathBuf::from("."),
                operation: "write cache file",
                source: std::io::Error::other(other.to_string()),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Inspect the cache directory".to_string(),
                },
            },
        }
    }
}

fn static_operation(operation: &str) -> &'static str {
    match operation {
        "create parent directory" => "create parent directory",
        "create temporary file" => "create temporary file",
        "write to temporary file" => "write to temporary file",
        "sync temporary file" => "sync temporary file",
        "atomic rename" => "atomic rename",
        _ => "write cache file",
    }
}
