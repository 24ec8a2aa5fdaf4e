//! Settings consumed by the fetch orchestrator.

use porygo_core::{Error, Result};
use porygo_utils::RetryPolicy;
use std::time::Duration;

/// Everything the orchestrator needs to run one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Number of executors, also used as the queue depth
    pub concurrency: usize,
    /// Deadline for each individual attempt
    pub per_request_timeout: Duration,
    /// Attempts per key, including the first
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub jitter_enabled: bool,
    /// Lifetime of entries written back to the cache
    pub cache_ttl: Duration,
    /// Skip the cache lookup and always fetch
    pub force_refresh: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        crate::Config::default().fetch_settings()
    }
}

impl FetchSettings {
    /// Reject settings that cannot run; nothing is fetched when this fails
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::configuration("concurrency must be greater than 0"));
        }
        if self.per_request_timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than 0"));
        }
        self.retry_policy().validate()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay, self.jitter_enabled)
    }
}
