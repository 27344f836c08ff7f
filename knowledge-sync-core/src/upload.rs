//! Upload stage: fetch, classify and submit every source item, one outcome per item.
//!
//! A failure for one item is recorded on that item's [`UploadOutcome`] and
//! never stops the remaining items.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::classify::classify_content;
use crate::contract::{ContentFetcher, KnowledgeClient, SourceItem};
use crate::error::{ItemError, UploadError};
use crate::policy::until_deadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    Uploaded,
    UploadFailed,
}

/// Result of the upload stage for one [`SourceItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: String,
    pub status: UploadStatus,
    pub remote_id: Option<String>,
    pub error_message: Option<String>,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

impl UploadOutcome {
    pub fn uploaded(item: &SourceItem, remote_id: String) -> Self {
        Self {
            path: item.path.clone(),
            status: UploadStatus::Uploaded,
            remote_id: Some(remote_id),
            error_message: None,
            size_bytes: item.size_bytes,
            last_modified: item.last_modified,
        }
    }

    pub fn failed(item: &SourceItem, error_message: String) -> Self {
        Self {
            path: item.path.clone(),
            status: UploadStatus::UploadFailed,
            remote_id: None,
            error_message: Some(error_message),
            size_bytes: item.size_bytes,
            last_modified: item.last_modified,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.status == UploadStatus::Uploaded
    }
}

/// Upload every item with at most `concurrency` in flight.
///
/// The returned vector is index-aligned with `items`.
pub async fn upload_all<F, K>(
    items: &[SourceItem],
    fetcher: &F,
    client: &K,
    credential: &str,
    concurrency: usize,
    deadline: Option<Instant>,
) -> Vec<UploadOutcome>
where
    F: ContentFetcher + ?Sized,
    K: KnowledgeClient + ?Sized,
{
    info!(items = items.len(), concurrency, "[SYNC][UPLOAD] Starting upload stage");

    let mut slots: Vec<Option<UploadOutcome>> = vec![None; items.len()];
    let mut completed = stream::iter(items.iter().enumerate())
        .map(|(index, item)| async move {
            let result = until_deadline(deadline, upload_one(item, fetcher, client, credential))
                .await
                .unwrap_or(Err(ItemError::DeadlineExceeded));
            let outcome = match result {
                Ok(remote_id) => {
                    info!(path = %item.path, remote_id = %remote_id, "[SYNC][UPLOAD] Uploaded file");
                    UploadOutcome::uploaded(item, remote_id)
                }
                Err(e) => {
                    error!(path = %item.path, error = %e, "[SYNC][ERROR][UPLOAD] Upload failed");
                    UploadOutcome::failed(item, e.to_string())
                }
            };
            (index, outcome)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((index, outcome)) = completed.next().await {
        slots[index] = Some(outcome);
    }

    let mut outcomes: Vec<UploadOutcome> = slots
        .into_iter()
        .zip(items)
        .map(|(slot, item)| {
            slot.unwrap_or_else(|| UploadOutcome::failed(item, "upload task did not complete".into()))
        })
        .collect();

    reject_duplicate_ids(&mut outcomes);

    let uploaded = outcomes.iter().filter(|o| o.is_uploaded()).count();
    info!(
        uploaded,
        failed = outcomes.len() - uploaded,
        "[SYNC][UPLOAD] Upload stage finished"
    );
    outcomes
}

async fn upload_one<F, K>(
    item: &SourceItem,
    fetcher: &F,
    client: &K,
    credential: &str,
) -> Result<String, ItemError>
where
    F: ContentFetcher + ?Sized,
    K: KnowledgeClient + ?Sized,
{
    debug!(path = %item.path, content_ref = %item.content_ref, "[SYNC][UPLOAD] Fetching content");
    let bytes = fetcher.fetch_content(&item.content_ref).await?;

    let content = classify_content(&item.path, bytes);
    debug!(
        path = %item.path,
        mime_type = content.mime_type,
        bytes = content.payload.len(),
        "[SYNC][UPLOAD] Classified content"
    );

    let remote_id = client
        .upload_file(credential, &item.path, content.mime_type, content.payload)
        .await?;
    if remote_id.trim().is_empty() {
        return Err(UploadError::MissingId.into());
    }
    Ok(remote_id)
}

// One upload call yields one downstream id; a repeated id means the later item
// cannot be told apart downstream.
fn reject_duplicate_ids(outcomes: &mut [UploadOutcome]) {
    let mut seen = HashSet::new();
    for outcome in outcomes.iter_mut() {
        let Some(remote_id) = outcome.remote_id.clone() else {
            continue;
        };
        if !seen.insert(remote_id.clone()) {
            warn!(path = %outcome.path, remote_id = %remote_id, "[SYNC][UPLOAD] Downstream returned a duplicate file id");
            outcome.status = UploadStatus::UploadFailed;
            outcome.remote_id = None;
            outcome.error_message = Some(format!("downstream returned duplicate file id {remote_id}"));
        }
    }
}
