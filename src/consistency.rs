//! Bounded re-reads over an eventually-consistent store
//!
//! Reads may trail writes, including the caller's own. Anything that needs a fresh value
//! re-reads with exponential backoff until the value is acceptable or the policy's attempt
//! or time budget runs out.

use crate::error::VcError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Attempt and time budget for re-reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPolicy {
    /// Total reads, including the first one
    pub max_attempts: u32,
    /// Delay before the second read; doubles after every further miss
    pub initial_backoff: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
    /// Optional wall-clock budget across all attempts
    pub budget: Option<Duration>,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(250),
            budget: None,
        }
    }
}

impl ReadPolicy {
    /// Re-read without sleeping between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            budget: None,
        }
    }

    /// Single read, no retries
    pub fn single() -> Self {
        Self::immediate(1)
    }

    /// Delay after the given (1-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Repeat `read` until `accept` holds for its value.
///
/// Transient failures (`NotFound`) count as a miss; any other error is returned as is.
/// Fails with `ConsistencyTimeout` once the budget is exhausted.
pub async fn read_until<T, F, Fut, A>(
    policy: &ReadPolicy,
    what: &str,
    mut read: F,
    accept: A,
) -> Result<T, VcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VcError>>,
    A: Fn(&T) -> bool,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    while attempts < max_attempts {
        attempts += 1;
        match read().await {
            Ok(value) if accept(&value) => return Ok(value),
            Ok(_) => debug!(what, attempt = attempts, "Read returned an older value"),
            Err(err) if err.is_transient() => {
                debug!(what, attempt = attempts, error = %err, "Read missed")
            }
            Err(err) => return Err(err),
        }

        if attempts == max_attempts || budget_spent(policy, started) {
            break;
        }
        sleep(policy.backoff(attempts)).await;
    }

    Err(VcError::ConsistencyTimeout {
        what: what.to_string(),
        attempts,
    })
}

/// Retry `read` while it fails transiently; the last transient error is returned when the
/// budget runs out.
pub async fn retry_transient<T, F, Fut>(
    policy: &ReadPolicy,
    what: &str,
    mut read: F,
) -> Result<T, VcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VcError>>,
{
    let started = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match read().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                if attempt >= max_attempts || budget_spent(policy, started) {
                    debug!(what, attempts = attempt, "Giving up on transient failure");
                    return Err(err);
                }
                debug!(what, attempt, error = %err, "Retrying after transient failure");
                sleep(policy.backoff(attempt)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn budget_spent(policy: &ReadPolicy, started: Instant) -> bool {
    policy
        .budget
        .map(|budget| started.elapsed() >= budget)
        .unwrap_or(false)
}
