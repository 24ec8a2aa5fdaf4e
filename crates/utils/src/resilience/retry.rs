//! Bounded retry loop with exponential backoff.

use super::policy::RetryPolicy;
use porygo_core::{Error, Result};
use std::future::Future;
use tokio::time::sleep;

/// Run `operation` until it succeeds or the policy's attempt budget is spent.
///
/// The closure receives the 1-based attempt number. Every error is treated as
/// retryable. Sleeping between attempts only suspends this loop, so many loops
/// can back off concurrently on the same runtime. When every attempt fails the
/// last error is wrapped in [`Error::RetriesExhausted`].
pub async fn run_with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.validate()?;

    let mut attempt = 1;
    loop {
        tracing::debug!(attempt, max_attempts = policy.max_attempts, "starting attempt");

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) if attempt >= policy.max_attempts => {
                tracing::warn!(attempt, %error, "final attempt failed");
                return Err(Error::retries_exhausted(attempt, error));
            }
            Err(error) => {
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "attempt failed, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_operation_is_attempted_exactly_max_times() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), false);
        let calls = Arc::new(AtomicUsize::new(0));

        let started = Instant::now();
        let result: Result<()> = run_with_retry(&policy, |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::network("https://example.com", "connection reset"))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after attempt 1, 2s after attempt 2, no sleep after the last one
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        let err = result.unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert!(err.to_string().contains("all 3 attempts failed"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), false);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let value = run_with_retry(&policy, |attempt| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(attempt);
                if attempt < 3 {
                    Err(Error::timeout("fetch", Duration::from_secs(1)))
                } else {
                    Ok("payload")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "payload");
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_zero_attempts_rejected_before_running() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1), true);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = run_with_retry(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(Error::Configuration { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jittered_sleep_never_exceeds_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1), true);

        let started = Instant::now();
        let _: Result<()> = run_with_retry(&policy, |_| async {
            Err(Error::network("https://example.com", "refused"))
        })
        .await;

        assert!(started.elapsed() <= Duration::from_secs(1 + 2 + 4));
    }
}
