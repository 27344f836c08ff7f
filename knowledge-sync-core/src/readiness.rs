//! Readiness poller: waits until uploaded files have been processed downstream.
//!
//! One settling delay is applied to the whole batch, then every uploaded item
//! is polled independently under the [`RetryPolicy`]. A "not ready yet" answer
//! is retried; a failed status call ends polling for that item at once.

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::contract::{KnowledgeClient, Sleeper};
use crate::policy::{until_deadline, RetryPolicy};
use crate::upload::UploadOutcome;

/// How polling ended for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The item was not uploaded, so it was never polled.
    Skipped,
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
    StatusFailed { attempt: u32, message: String },
    DeadlineExceeded,
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }
}

/// Poll every uploaded outcome; the result is index-aligned with `outcomes`.
///
/// Makes no calls and does not sleep when nothing was uploaded.
pub async fn await_readiness<K, S>(
    outcomes: &[UploadOutcome],
    client: &K,
    sleeper: &S,
    credential: &str,
    policy: &RetryPolicy,
    concurrency: usize,
    deadline: Option<Instant>,
) -> Vec<PollOutcome>
where
    K: KnowledgeClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut results = vec![PollOutcome::Skipped; outcomes.len()];
    let pending: Vec<(usize, &str)> = outcomes
        .iter()
        .enumerate()
        .filter_map(|(index, o)| {
            o.remote_id
                .as_deref()
                .filter(|_| o.is_uploaded())
                .map(|id| (index, id))
        })
        .collect();
    if pending.is_empty() {
        debug!("[SYNC][POLL] Nothing uploaded, skipping readiness polling");
        return results;
    }

    info!(
        items = pending.len(),
        settling_delay = ?policy.settling_delay,
        "[SYNC][POLL] Waiting for downstream processing to settle"
    );
    if until_deadline(deadline, sleeper.sleep(policy.settling_delay))
        .await
        .is_none()
    {
        warn!("[SYNC][POLL] Deadline passed during settling delay");
        for (index, _) in pending {
            results[index] = PollOutcome::DeadlineExceeded;
        }
        return results;
    }

    let mut polled = stream::iter(pending)
        .map(|(index, remote_id)| async move {
            let outcome = until_deadline(
                deadline,
                poll_one(remote_id, client, sleeper, credential, policy),
            )
            .await
            .unwrap_or(PollOutcome::DeadlineExceeded);
            (index, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, outcome)) = polled.next().await {
        results[index] = outcome;
    }

    let ready = results.iter().filter(|r| r.is_ready()).count();
    info!(ready, "[SYNC][POLL] Readiness polling finished");
    results
}

async fn poll_one<K, S>(
    remote_id: &str,
    client: &K,
    sleeper: &S,
    credential: &str,
    policy: &RetryPolicy,
) -> PollOutcome
where
    K: KnowledgeClient + ?Sized,
    S: Sleeper + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        match client.file_status(credential, remote_id).await {
            Ok(status) if status.is_ready() => {
                info!(remote_id, attempt, "[SYNC][POLL] File processed");
                return PollOutcome::Ready { attempts: attempt };
            }
            Ok(status) => {
                debug!(
                    remote_id,
                    attempt,
                    processed = status.processed,
                    has_content = status.has_content,
                    "[SYNC][POLL] File not ready yet"
                );
                if attempt < policy.max_attempts {
                    sleeper.sleep(policy.inter_attempt_delay).await;
                }
            }
            Err(e) => {
                // Not retried: a broken status call is treated as final for this run.
                warn!(remote_id, attempt, error = %e, "[SYNC][POLL] Status check failed, giving up on file");
                return PollOutcome::StatusFailed {
                    attempt,
                    message: e.to_string(),
                };
            }
        }
    }

    warn!(
        remote_id,
        attempts = policy.max_attempts,
        "[SYNC][POLL] File not processed within attempt budget"
    );
    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    }
}
