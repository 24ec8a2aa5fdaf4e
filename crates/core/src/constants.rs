/// Constants used throughout the porygo codebase

// Application directory name under the platform cache/config roots
pub const APP_DIR_NAME: &str = "porygo";

// Cache database file name
pub const CACHE_FILE_NAME: &str = "cache.db";

// Sidecar lock file guarding the cache database
pub const CACHE_LOCK_FILE_NAME: &str = "cache.db.lock";

// Default configuration file, relative to the working directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

// User agent sent with every fetch attempt
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

// Environment variable consulted for log filtering before the CLI flags
pub const PORYGO_LOG_VAR: &str = "PORYGO_LOG";
