//! Collection assigner: attaches ready files to the target collection.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info};

use crate::contract::KnowledgeClient;
use crate::policy::until_deadline;
use crate::readiness::PollOutcome;
use crate::upload::UploadOutcome;

/// Collection outcome of an uploaded item. Absent (`None`) when no collection
/// target was configured or the upload itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionStatus {
    Added,
    CollectionFailed,
    NotProcessed,
}

/// Assign every ready item to `collection_id`; index-aligned with `outcomes`.
///
/// Uploaded items that never became ready are `NotProcessed` and get no call.
/// A failed assignment leaves the upload outcome untouched.
pub async fn assign_all<K>(
    outcomes: &[UploadOutcome],
    readiness: &[PollOutcome],
    client: &K,
    credential: &str,
    collection_id: &str,
    concurrency: usize,
    deadline: Option<Instant>,
) -> Vec<Option<CollectionStatus>>
where
    K: KnowledgeClient + ?Sized,
{
    let mut statuses: Vec<Option<CollectionStatus>> = outcomes
        .iter()
        .map(|o| o.is_uploaded().then_some(CollectionStatus::NotProcessed))
        .collect();

    let ready: Vec<(usize, &str)> = outcomes
        .iter()
        .zip(readiness)
        .enumerate()
        .filter(|(_, (outcome, poll))| outcome.is_uploaded() && poll.is_ready())
        .filter_map(|(index, (outcome, _))| outcome.remote_id.as_deref().map(|id| (index, id)))
        .collect();

    info!(ready = ready.len(), collection_id, "[SYNC][ASSIGN] Adding ready files to collection");

    let mut assigned = stream::iter(ready)
        .map(|(index, remote_id)| async move {
            let result = until_deadline(
                deadline,
                client.add_to_collection(credential, collection_id, remote_id),
            )
            .await;
            let status = match result {
                Some(Ok(())) => {
                    info!(remote_id, collection_id, "[SYNC][ASSIGN] Added file to collection");
                    CollectionStatus::Added
                }
                Some(Err(e)) => {
                    error!(remote_id, collection_id, error = %e, "[SYNC][ERROR][ASSIGN] Adding file to collection failed");
                    CollectionStatus::CollectionFailed
                }
                None => {
                    error!(remote_id, collection_id, "[SYNC][ERROR][ASSIGN] Deadline passed while adding file to collection");
                    CollectionStatus::CollectionFailed
                }
            };
            (index, status)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, status)) = assigned.next().await {
        statuses[index] = Some(status);
    }
    statuses
}
