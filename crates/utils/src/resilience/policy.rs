//! Retry budget and backoff schedule.

use porygo_core::{Error, Result};
use rand::Rng;
use std::time::Duration;

/// Default number of attempts per operation
const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default base delay for exponential backoff
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Lower bound of the delay ceiling
const MIN_DELAY_CEILING: Duration = Duration::from_secs(30);

/// The ceiling is never below `base_delay * DELAY_CEILING_FACTOR`
const DELAY_CEILING_FACTOR: u32 = 16;

/// Growth factor between consecutive delays
const BACKOFF_MULTIPLIER: u32 = 2;

/// Attempt budget and backoff schedule for one retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Replace each delay with a uniform sample from `[0, delay]`
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, jitter: bool) -> Self {
        Self {
            max_attempts,
            base_delay,
            jitter,
        }
    }

    /// Reject budgets that cannot run a single attempt
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::configuration(
                "retry max_attempts must be at least 1",
            ));
        }
        if self.base_delay.is_zero() {
            return Err(Error::configuration(
                "backoff base_delay must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Ceiling applied to every computed delay: `max(30s, base_delay * 16)`
    pub fn max_delay(&self) -> Duration {
        MIN_DELAY_CEILING.max(self.base_delay.saturating_mul(DELAY_CEILING_FACTOR))
    }

    /// Delay after the failed attempt `attempt` (1-based), before jitter
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let factor = BACKOFF_MULTIPLIER.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor).min(self.max_delay())
    }

    /// Delay to actually sleep after the failed attempt `attempt`
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let delay = self.delay_for(attempt);
        if self.jitter {
            delay.mul_f64(rand::thread_rng().gen::<f64>())
        } else {
            delay
        }
    }
}
