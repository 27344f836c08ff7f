//! Readiness retry policy and run-deadline helpers.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_INTER_ATTEMPT_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_SETTLING_DELAY: Duration = Duration::from_secs(5);

/// How long to wait for downstream processing before giving up on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Status checks per item, including the first one.
    pub max_attempts: u32,
    /// Wait between two status checks of the same item.
    pub inter_attempt_delay: Duration,
    /// One-off wait before the first status check of the batch.
    pub settling_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            inter_attempt_delay: DEFAULT_INTER_ATTEMPT_DELAY,
            settling_delay: DEFAULT_SETTLING_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Worst-case time spent polling one item after the settling delay,
    /// excluding the status calls themselves.
    pub fn max_wait(&self) -> Duration {
        self.inter_attempt_delay * self.max_attempts.saturating_sub(1)
    }
}

/// Run `fut` to completion, or until `deadline` passes. `None` means no deadline.
pub(crate) async fn until_deadline<F: Future>(
    deadline: Option<Instant>,
    fut: F,
) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}
