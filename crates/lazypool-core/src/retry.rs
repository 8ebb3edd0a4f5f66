//! Caller-side retry around `materialize()`
//!
//! Factories never retry on their own. A caller that wants to ride out a
//! database that is still starting up can opt in here:
//!
//! ```ignore
//! use lazypool_core::retry::{RetryPolicy, materialize_with_retry};
//!
//! let policy = RetryPolicy::for_tuning(5, factory.tuning());
//! let pool = materialize_with_retry(&factory, &policy).await?;
//! ```
//!
//! Only transient failures (unreachable server, timeouts) are retried.
//! Authentication and configuration failures return immediately since
//! repeating them cannot help.

#[cfg(test)]
mod tests;

use std::time::Duration;

use rand::Rng;

use crate::{FactoryError, PoolFactory, PoolTuning};

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times to retry and how long to wait in between.
///
/// The wait doubles after every retry, starting at the base delay and
/// never exceeding the max delay. With jitter on, each wait is drawn
/// uniformly from the upper half of that value.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retry attempts after the first try (0 = no retry)
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }

    /// Policy whose longest wait matches the pool's acquire timeout.
    pub fn for_tuning(max_attempts: u32, tuning: &PoolTuning) -> Self {
        Self::new(max_attempts).with_delays(DEFAULT_BASE_DELAY, tuning.acquire_timeout())
    }

    /// Set the first and longest wait. `base` is at least 1ms and `max`
    /// is at least `base`.
    pub fn with_delays(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base.max(Duration::from_millis(1));
        self.max_delay = max.max(self.base_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let capped = self
            .base_delay
            .saturating_mul(1u32 << retry.min(31))
            .min(self.max_delay);
        if !self.jitter {
            return capped;
        }

        let millis = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Materialize, retrying transient failures according to `policy`.
///
/// Returns the last error once retries are exhausted.
pub async fn materialize_with_retry<F>(
    factory: &F,
    policy: &RetryPolicy,
) -> Result<F::Handle, FactoryError>
where
    F: PoolFactory + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        match factory.materialize().await {
            Ok(handle) => return Ok(handle),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "materialize failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
