//! Worker pool for porygo
//!
//! A fixed number of executors pull [`WorkItem`]s from a bounded input queue
//! and publish one [`WorkOutput`] per item they run. Cancellation stops new
//! dequeues without interrupting an item that is already running.

mod item;
mod pool;

pub use item::{WorkItem, WorkOutput};
pub use pool::{PoolState, WorkerPool};
pub use tokio_util::sync::CancellationToken;
