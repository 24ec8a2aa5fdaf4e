//! Fetch orchestration for porygo
//!
//! [`Orchestrator::fetch_all`] checks the cache for every key, runs misses
//! through the retry controller on a [`WorkerPool`](porygo_pool::WorkerPool),
//! writes fresh bodies back to the cache and streams one [`FetchResult`] per
//! distinct key in completion order.

pub mod extract;
pub mod fetcher;
pub mod orchestrator;

pub use extract::Extractor;
pub use fetcher::{Fetcher, HttpFetcher};
pub use orchestrator::{FetchResult, Orchestrator};
pub use porygo_pool::CancellationToken;
