//! Error taxonomy for a sync run.
//!
//! Only [`SyncError`] aborts a run. Every other error type here is contained
//! to a single item and ends up as a status in the [`crate::report::RunReport`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Invalid or incomplete run configuration. Fatal, raised before any listing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("downstream base URL is not configured")]
    MissingBaseUrl,

    #[error("downstream base URL '{0}' is not an absolute http(s) URL")]
    InvalidBaseUrl(String),

    #[error("downstream API key is not configured")]
    MissingDownstreamCredential,

    #[error("storage listing token is not configured")]
    MissingStorageCredential,

    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// The source listing could not be produced. Fatal.
#[derive(Debug, Error)]
#[error("listing source items failed: {0}")]
pub struct ListingError(pub String);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("content fetch returned HTTP {status}")]
    Status { status: u16 },

    #[error("content fetch failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("upload rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("upload response did not contain a file id")]
    MissingId,
}

#[derive(Debug, Error)]
#[error("status check failed: {0}")]
pub struct StatusError(pub String);

#[derive(Debug, Error)]
#[error("adding file to collection failed: {0}")]
pub struct AssignError(pub String);

/// Everything that can go wrong for one item during the upload stage.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listing(#[from] ListingError),
}

/// A fatal run failure together with the moment it happened.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SyncFailure {
    pub error: SyncError,
    pub timestamp: DateTime<Utc>,
}

/// Serializable form of a [`SyncFailure`], the run's single fatal-error response.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncFailure {
    pub fn now(error: impl Into<SyncError>) -> Self {
        Self {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_response(&self) -> FailureResponse {
        FailureResponse {
            error: self.error.to_string(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn sync_failure_message_is_not_repeated_in_its_chain() {
        let failure = SyncFailure::now(ListingError("listing API returned HTTP 403".into()));

        assert_eq!(
            failure.to_string(),
            "listing source items failed: listing API returned HTTP 403"
        );
        assert!(failure.source().is_none());
    }

    #[test]
    fn failure_response_carries_message_and_timestamp() {
        let failure = SyncFailure::now(ConfigError::MissingDownstreamCredential);
        let response = failure.to_response();
        assert_eq!(
            response.error,
            "configuration error: downstream API key is not configured"
        );
        assert_eq!(response.timestamp, failure.timestamp);
    }
}
