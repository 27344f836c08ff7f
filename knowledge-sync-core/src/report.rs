//! Run aggregator: merges per-item stage outcomes into the final [`RunReport`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assign::CollectionStatus;
use crate::upload::{UploadOutcome, UploadStatus};

/// Consolidated result of one sync run. Returned to the caller, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub added_to_collection: usize,
    pub timestamp: DateTime<Utc>,
    /// One entry per listed item, in listing order.
    pub results: Vec<ItemResult>,
    pub errors: Vec<ItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub file: String,
    pub status: UploadStatus,
    #[serde(rename = "openWebUIId")]
    pub remote_id: Option<String>,
    pub collection_status: Option<CollectionStatus>,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub file: String,
    pub error: String,
}

impl RunReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Merge upload outcomes with their collection statuses.
///
/// `collection` is index-aligned with `outcomes`; missing trailing entries
/// count as `None`.
pub fn aggregate(
    outcomes: Vec<UploadOutcome>,
    collection: Vec<Option<CollectionStatus>>,
    timestamp: DateTime<Utc>,
) -> RunReport {
    let mut collection = collection.into_iter();
    let results: Vec<ItemResult> = outcomes
        .into_iter()
        .map(|outcome| {
            let collection_status = collection.next().flatten().filter(|_| outcome.is_uploaded());
            ItemResult {
                file: outcome.path,
                status: outcome.status,
                remote_id: outcome.remote_id,
                collection_status,
                size: outcome.size_bytes,
                uploaded_at: outcome.last_modified,
                error: outcome.error_message,
            }
        })
        .collect();

    let successful = results
        .iter()
        .filter(|r| r.status == UploadStatus::Uploaded)
        .count();
    let added_to_collection = results
        .iter()
        .filter(|r| r.collection_status == Some(CollectionStatus::Added))
        .count();
    let errors: Vec<ItemFailure> = results
        .iter()
        .filter(|r| r.status == UploadStatus::UploadFailed)
        .map(|r| ItemFailure {
            file: r.file.clone(),
            error: r.error.clone().unwrap_or_else(|| "unknown error".to_string()),
        })
        .collect();

    tracing::info!(
        total = results.len(),
        successful,
        failed = errors.len(),
        added_to_collection,
        "[SYNC][REPORT] Run report aggregated"
    );

    RunReport {
        total_files: results.len(),
        successful,
        failed: errors.len(),
        added_to_collection,
        timestamp,
        results,
        errors,
    }
}
