//! The network side of a fetch: one attempt, no retries

use async_trait::async_trait;
use porygo_core::{Error, Result, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Performs a single attempt to retrieve the resource named by `key`.
///
/// Any error is treated as retryable by the caller; the returned bytes are
/// cached verbatim.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn attempt(&self, key: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// HTTP GET fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn attempt(&self, key: &str, timeout: Duration) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(key)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(key, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(key, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| classify(key, timeout, e))?;
        debug!(key = %key, status = status.as_u16(), size = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

fn classify(key: &str, timeout: Duration, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::timeout(format!("GET {key}"), timeout)
    } else {
        Error::network(key, error.to_string())
    }
}
