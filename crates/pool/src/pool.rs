use crate::item::{WorkItem, WorkOutput};
use futures::FutureExt;
use parking_lot::Mutex;
use porygo_core::{Error, Result};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Pool lifecycle: `Created -> Running -> Draining -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Queues allocated, no executors yet
    Created,
    /// Executors are consuming the input queue
    Running,
    /// Input closed; waiting for executors to finish
    Draining,
    /// Output closed; the pool is spent
    Closed,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Created => write!(f, "created"),
            PoolState::Running => write!(f, "running"),
            PoolState::Draining => write!(f, "draining"),
            PoolState::Closed => write!(f, "closed"),
        }
    }
}

type SharedReceiver<T> = Arc<tokio::sync::Mutex<mpsc::Receiver<WorkItem<T>>>>;

/// A fixed set of async executors fed by a bounded queue.
///
/// Every item an executor dequeues yields exactly one [`WorkOutput`]; items
/// still queued when the run is cancelled are dropped without output.
/// The output queue has the same bound as the input queue, so results must
/// be consumed while the pool runs.
pub struct WorkerPool<T> {
    workers: usize,
    queue_capacity: usize,
    state: Mutex<PoolState>,
    input_tx: Mutex<Option<mpsc::Sender<WorkItem<T>>>>,
    input_rx: SharedReceiver<T>,
    output_tx: Mutex<Option<mpsc::Sender<WorkOutput<T>>>>,
    output_rx: Mutex<Option<mpsc::Receiver<WorkOutput<T>>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    run_token: Mutex<Option<CancellationToken>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Allocate the queues. Capacities of zero are raised to one.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        let queue_capacity = queue_capacity.max(1);
        let (input_tx, input_rx) = mpsc::channel(queue_capacity);
        let (output_tx, output_rx) = mpsc::channel(queue_capacity);

        Self {
            workers: workers.max(1),
            queue_capacity,
            state: Mutex::new(PoolState::Created),
            input_tx: Mutex::new(Some(input_tx)),
            input_rx: Arc::new(tokio::sync::Mutex::new(input_rx)),
            output_tx: Mutex::new(Some(output_tx)),
            output_rx: Mutex::new(Some(output_rx)),
            handles: Mutex::new(Vec::new()),
            run_token: Mutex::new(None),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn state(&self) -> PoolState {
        *self.state.lock()
    }

    /// Spawn the executors. Must be called from within a tokio runtime.
    pub fn start(&self, cancel: &CancellationToken) -> Result<()> {
        let mut state = self.state.lock();
        if *state != PoolState::Created {
            return Err(Error::pool_closed(format!(
                "cannot start a pool that is {state}"
            )));
        }

        let output_tx = self
            .output_tx
            .lock()
            .clone()
            .ok_or_else(|| Error::pool_closed("output queue already closed"))?;

        let mut handles = self.handles.lock();
        for worker_id in 0..self.workers {
            handles.push(tokio::spawn(run_worker(
                worker_id,
                Arc::clone(&self.input_rx),
                output_tx.clone(),
                cancel.clone(),
            )));
        }

        *self.run_token.lock() = Some(cancel.clone());
        *state = PoolState::Running;
        debug!(workers = self.workers, capacity = self.queue_capacity, "worker pool started");
        Ok(())
    }

    /// Enqueue one item, waiting for room or for `cancel`.
    ///
    /// Fails with [`Error::Cancelled`] if either `cancel` or the pool's run
    /// token fires first, and with [`Error::PoolClosed`] once the pool is
    /// draining. The item is not enqueued in either case.
    pub async fn submit(&self, cancel: &CancellationToken, item: WorkItem<T>) -> Result<()> {
        let run_token = self.run_token.lock().clone().unwrap_or_default();
        if cancel.is_cancelled() || run_token.is_cancelled() {
            return Err(Error::cancelled(format!("submit '{}'", item.label())));
        }

        let tx = match self.state() {
            PoolState::Draining | PoolState::Closed => None,
            PoolState::Created | PoolState::Running => self.input_tx.lock().clone(),
        }
        .ok_or_else(|| Error::pool_closed(format!("cannot submit '{}'", item.label())))?;

        let label = item.label().to_string();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled(format!("submit '{label}'"))),
            _ = run_token.cancelled() => Err(Error::cancelled(format!("submit '{label}'"))),
            sent = tx.send(item) => sent.map_err(|_| Error::pool_closed(format!("cannot submit '{label}'"))),
        }
    }

    /// The result stream. It ends once [`shutdown`](Self::shutdown) returns
    /// and can be taken only once.
    pub fn take_results(&self) -> Result<ReceiverStream<WorkOutput<T>>> {
        self.output_rx
            .lock()
            .take()
            .map(ReceiverStream::new)
            .ok_or_else(|| Error::pool_closed("results were already taken"))
    }

    /// Close the input queue, wait for every executor to exit, then close
    /// the output queue. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if matches!(*state, PoolState::Draining | PoolState::Closed) {
                return;
            }
            *state = PoolState::Draining;
        }

        self.input_tx.lock().take();

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }

        self.output_tx.lock().take();
        *self.state.lock() = PoolState::Closed;
        debug!("worker pool closed");
    }
}

impl<T> fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

async fn run_worker<T: Send + 'static>(
    worker_id: usize,
    input: SharedReceiver<T>,
    output: mpsc::Sender<WorkOutput<T>>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(worker_id, "worker stopping on cancellation");
                break;
            }
            next = async { input.lock().await.recv().await } => next,
        };

        let Some(item) = next else {
            debug!(worker_id, "input queue drained");
            break;
        };

        let output_item = execute(worker_id, item).await;
        if output.send(output_item).await.is_err() {
            warn!(worker_id, "result stream dropped; worker exiting");
            break;
        }
    }
}

/// Run one item to completion, turning a panic into a failed result
async fn execute<T: Send + 'static>(worker_id: usize, item: WorkItem<T>) -> WorkOutput<T> {
    let (label, job) = item.into_parts();
    debug!(worker_id, label = %label, "running work item");

    let result = match AssertUnwindSafe(async move { job().await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(worker_id, label = %label, panic = %message, "work item panicked");
            Err(Error::worker_panic(label.clone(), message))
        }
    };

    WorkOutput { label, result }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
