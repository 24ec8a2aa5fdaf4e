//! Resilience patterns for recovering from transient failures.
//!
//! ## Key Components
//!
//! - [`policy`] - `RetryPolicy`, the attempt budget and exponential backoff
//!   schedule with optional full jitter
//! - [`retry`] - `run_with_retry`, the bounded retry loop driven by a policy
//!
//! ## Example
//!
//! ```rust,no_run
//! use porygo_utils::resilience::{run_with_retry, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> porygo_core::Result<String> {
//! let policy = RetryPolicy::new(3, Duration::from_secs(1), true);
//! run_with_retry(&policy, |attempt| async move {
//!     // one attempt of the real operation
//!     Ok(format!("succeeded on attempt {attempt}"))
//! })
//! .await
//! # }
//! ```

pub mod policy;
pub mod retry;

pub use policy::RetryPolicy;
pub use retry::run_with_retry;
