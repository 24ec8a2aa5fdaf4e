use porygo_core::{APP_DIR_NAME, CACHE_FILE_NAME, CACHE_LOCK_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Platform directories for porygo
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CACHE_HOME/porygo, or the platform cache directory
    ///
    /// Without `XDG_CACHE_HOME` this is `~/Library/Caches` on macOS,
    /// `%LOCALAPPDATA%` on Windows and `~/.cache` elsewhere.
    pub fn cache_dir() -> PathBuf {
        env::var_os("XDG_CACHE_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join(APP_DIR_NAME)
    }

    /// Get XDG_CONFIG_HOME/porygo, or the platform config directory
    pub fn config_dir() -> PathBuf {
        env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
    }

    /// The cache database shared by every invocation for this user
    pub fn cache_file() -> PathBuf {
        Self::cache_dir().join(CACHE_FILE_NAME)
    }

    /// Sidecar lock file for a cache database at `db_path`
    pub fn lock_file_for(db_path: &Path) -> PathBuf {
        db_path
            .parent()
            .map(|dir| dir.join(CACHE_LOCK_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CACHE_LOCK_FILE_NAME))
    }
}
