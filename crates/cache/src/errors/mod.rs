//! Error types for the cache store

mod conversions;
mod display;
mod types;

pub use types::{CacheError, RecoveryHint, Result};
