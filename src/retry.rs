use std::{future::Future, time::Duration};

use crate::error::{StoreError, WriteError};

/// RetryPolicy
///
/// How hard to push a write against a busy single-writer store. The wait before
/// attempt `n + 1` is `base_backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }
}

/// Runs `write_op` until it succeeds, fails for a non-transient reason, or has been
/// attempted `policy.max_attempts` times (at least once).
///
/// Only `StoreError::Busy` is retried. Running out of attempts yields
/// `WriteError::Exhausted`, never the last store error. The backoff sleeps the
/// calling task only.
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op: &str,
    mut write_op: F,
) -> Result<T, WriteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match write_op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                tracing::warn!(op, attempt, max_attempts, "store busy, retrying write");
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff_for(attempt)).await;
                }
            }
            Err(e) => return Err(WriteError::Store(e)),
        }
    }
    Err(WriteError::Exhausted {
        attempts: max_attempts,
    })
}
