//! Shared utilities for porygo
//!
//! This crate provides the building blocks the cache, the pool and the CLI
//! lean on: the retry/backoff controller, platform paths, crash-safe file
//! writes, exclusive file locking and tracing setup.

pub mod atomic_file;
pub mod duration;
pub mod file_lock;
pub mod resilience;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use duration::*;
pub use file_lock::*;
pub use resilience::*;
pub use xdg::*;
