//! Core domain types, errors, and constants for `porygo`.
//!
//! Every other crate in the workspace builds on the items defined here.
//!
//! ## Key Components
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias. Fetch failures,
//!   configuration problems, cancellation and pool faults all funnel through it
//!   so that each key's outcome can be reported on its own.
//! - **`types`**: the persisted `CacheEntry` and the `Payload` variant that
//!   carries a fetch outcome from the pool back to the caller.
//! - **`constants`**: shared names such as the application directory and the
//!   cache file name.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
