//! Cache-gated batch fetching

use crate::extract::Extractor;
use crate::fetcher::Fetcher;
use indexmap::IndexSet;
use parking_lot::Mutex;
use porygo_cache::CacheStorage;
use porygo_config::FetchSettings;
use porygo_core::{CacheEntry, Error, Payload, Result};
use porygo_pool::{CancellationToken, WorkItem, WorkOutput, WorkerPool};
use porygo_utils::run_with_retry;
use porygo_utils::tracing as log;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn, Instrument};

/// Terminal outcome for one key of a batch
#[derive(Debug)]
pub struct FetchResult {
    pub key: String,
    pub result: Result<Payload>,
}

/// Outcome of looking a key up before fetching it
enum Lookup {
    Hit(CacheEntry),
    Miss,
}

/// Composes the cache, the retry controller and the worker pool.
///
/// Cheap to clone; clones share the fetcher and the cache handle.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn CacheStorage>,
    settings: FetchSettings,
    extractor: Option<Arc<Extractor>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("settings", &self.settings)
            .field("extracting", &self.extractor.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<dyn CacheStorage>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            fetcher,
            cache,
            settings,
            extractor: None,
        }
    }

    /// Deliver successes as [`Payload::Extracted`] instead of raw bytes.
    ///
    /// The cache still stores the raw body.
    pub fn with_extractor(mut self, extractor: Arc<Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetch every distinct key and stream the outcomes as they complete.
    ///
    /// Invalid settings fail here, before any key is looked up. Afterwards
    /// each distinct key produces exactly one [`FetchResult`]; keys that were
    /// never run because `cancel` fired get [`Error::Cancelled`]. Must be
    /// called from within a tokio runtime.
    pub fn fetch_all<I>(
        &self,
        keys: I,
        cancel: CancellationToken,
    ) -> Result<ReceiverStream<FetchResult>>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.settings.validate()?;

        let keys: IndexSet<String> = keys.into_iter().map(Into::into).collect();
        let (tx, rx) = mpsc::channel(self.settings.concurrency);

        let span = log::batch_span(keys.len(), self.settings.concurrency);
        tokio::spawn(self.clone().drive(keys, cancel, tx).instrument(span));

        Ok(ReceiverStream::new(rx))
    }

    async fn drive(
        self,
        keys: IndexSet<String>,
        cancel: CancellationToken,
        out: mpsc::Sender<FetchResult>,
    ) {
        let total = keys.len();
        let pool = WorkerPool::new(self.settings.concurrency, self.settings.concurrency);
        let pending = Arc::new(Mutex::new(HashSet::new()));

        let forwarder = match pool.take_results() {
            Ok(results) => tokio::spawn(self.clone().forward(results, Arc::clone(&pending), out.clone())),
            Err(e) => {
                error!(error = %e, "worker pool result stream unavailable");
                return;
            }
        };

        if let Err(e) = pool.start(&cancel) {
            error!(error = %e, "failed to start worker pool");
            for key in keys {
                emit(&out, key, Err(Error::pool_closed(e.to_string()))).await;
            }
            return;
        }

        let mut hits = 0usize;
        for key in keys {
            if !self.settings.force_refresh {
                if let Lookup::Hit(entry) = self.lookup(&key).await {
                    hits += 1;
                    let payload = self.finish(&key, Payload::Cached(entry));
                    emit(&out, key, Ok(payload)).await;
                    continue;
                }
            }

            pending.lock().insert(key.clone());
            if let Err(e) = pool.submit(&cancel, self.work_item(&key)).await {
                pending.lock().remove(&key);
                debug!(key = %key, error = %e, "work item not submitted");
                emit(&out, key, Err(e)).await;
            }
        }

        pool.shutdown().await;
        if let Err(e) = forwarder.await {
            error!(error = %e, "result forwarder ended abnormally");
        }

        let unfinished: Vec<String> = pending.lock().drain().collect();
        for key in unfinished {
            let err = Error::cancelled(format!("fetch '{key}'"));
            emit(&out, key, Err(err)).await;
        }

        info!(total, cache_hits = hits, "batch finished");
    }

    /// Cache gate for one key; any storage trouble counts as a miss
    async fn lookup(&self, key: &str) -> Lookup {
        match self.cache.get(key) {
            Ok(Some(entry)) if entry.is_valid_at(SystemTime::now()) => {
                log::cache_event(key, true, "lookup");
                Lookup::Hit(entry)
            }
            Ok(Some(_)) => {
                log::cache_event(key, false, "lookup");
                debug!(key = %key, "cached data expired, discarding");
                let cache = Arc::clone(&self.cache);
                let owned = key.to_string();
                match tokio::task::spawn_blocking(move || cache.delete(&owned)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(key = %key, error = %e, "failed to delete expired entry"),
                    Err(e) => error!(key = %key, error = %e, "cache delete task failed"),
                }
                Lookup::Miss
            }
            Ok(None) => {
                log::cache_event(key, false, "lookup");
                Lookup::Miss
            }
            Err(e) => {
                error!(key = %key, error = %e, "failed to read cache, fetching instead");
                Lookup::Miss
            }
        }
    }

    /// One retrying fetch of `key`, each attempt bounded by the per-request timeout
    fn work_item(&self, key: &str) -> WorkItem<Vec<u8>> {
        let fetcher = Arc::clone(&self.fetcher);
        let policy = self.settings.retry_policy();
        let timeout = self.settings.per_request_timeout;
        let owned = key.to_string();
        let span = log::fetch_span(key);

        WorkItem::new(key, move || {
            let retrying = async move {
                run_with_retry(&policy, |attempt| {
                    let fetcher = Arc::clone(&fetcher);
                    let key = owned.clone();
                    async move {
                        debug!(attempt, "fetch attempt");
                        match tokio::time::timeout(timeout, fetcher.attempt(&key, timeout)).await {
                            Ok(result) => result,
                            Err(_) => Err(Error::timeout(format!("fetch '{key}'"), timeout)),
                        }
                    }
                })
                .await
            };
            retrying.instrument(span)
        })
    }

    /// Relay pool output to the caller, writing successful bodies to the cache
    async fn forward(
        self,
        mut results: ReceiverStream<WorkOutput<Vec<u8>>>,
        pending: Arc<Mutex<HashSet<String>>>,
        out: mpsc::Sender<FetchResult>,
    ) {
        while let Some(WorkOutput { label, result }) = results.next().await {
            pending.lock().remove(&label);
            let result = match result {
                Ok(body) => {
                    if !body.is_empty() {
                        self.store(&label, &body).await;
                    }
                    Ok(self.finish(&label, Payload::Fetched(body)))
                }
                Err(e) => {
                    warn!(key = %label, error = %e, "fetch failed");
                    Err(e)
                }
            };
            emit(&out, label, result).await;
        }
    }

    fn finish(&self, key: &str, payload: Payload) -> Payload {
        match &self.extractor {
            Some(extractor) => Payload::Extracted(extractor.scrape(key, &payload)),
            None => payload,
        }
    }

    async fn store(&self, key: &str, body: &[u8]) {
        let cache = Arc::clone(&self.cache);
        let owned = key.to_string();
        let entry = CacheEntry::with_ttl(body.to_vec(), self.settings.cache_ttl);

        match tokio::task::spawn_blocking(move || cache.set(&owned, &entry)).await {
            Ok(Ok(())) => debug!(key = %key, "stored in cache"),
            Ok(Err(e)) => error!(key = %key, error = %e, "failed to store in cache"),
            Err(e) => error!(key = %key, error = %e, "cache write task failed"),
        }
    }
}

async fn emit(out: &mpsc::Sender<FetchResult>, key: String, result: Result<Payload>) {
    if out.send(FetchResult { key, result }).await.is_err() {
        debug!("result receiver dropped");
    }
}
