//! # contract: capabilities the sync engine consumes
//!
//! This module defines the data handed between the sync stages and one trait
//! per external capability: listing the object store, fetching content,
//! talking to the downstream ingestion service, and sleeping.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so `MockSourceLister`,
//!   `MockContentFetcher`, `MockKnowledgeClient` and `MockSleeper` are
//!   available to unit tests, integration tests and downstream crates
//!   (feature `test-export-mocks`, on by default).
//!
//! ## Adding New Destinations
//! - Implement [`KnowledgeClient`] for the new service.
//! - Map transport failures onto the typed errors in [`crate::error`]; the
//!   engine decides which of them are fatal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{AssignError, FetchError, ListingError, StatusError, UploadError};

/// One file enumerated from the object-storage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Path of the object inside the store. Unique within a run.
    pub path: String,
    /// Opaque locator passed back to [`ContentFetcher::fetch_content`].
    pub content_ref: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Utc>,
}

/// Upload body, either decoded text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Text(text) => text.into_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }
}

/// Fetched content together with the MIME type it will be uploaded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedContent {
    pub mime_type: &'static str,
    pub payload: Payload,
}

/// Processing state of an uploaded file as reported downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStatus {
    /// Downstream reports a terminal-success processing state.
    pub processed: bool,
    /// Extracted content is present and non-empty.
    pub has_content: bool,
}

impl FileStatus {
    pub fn is_ready(&self) -> bool {
        self.processed && self.has_content
    }
}

/// Enumerates the source items of one run.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait SourceLister: Send + Sync {
    async fn list_items(&self, credential: &str) -> Result<Vec<SourceItem>, ListingError>;
}

/// Retrieves raw bytes for a [`SourceItem::content_ref`].
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_content(&self, content_ref: &str) -> Result<Vec<u8>, FetchError>;
}

/// The downstream document-ingestion service.
///
/// Implementors own the transport and base URL; the credential is passed per
/// call so one client can serve several runs.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait KnowledgeClient: Send + Sync {
    /// Create a downstream file and return its id.
    async fn upload_file(
        &self,
        credential: &str,
        filename: &str,
        mime_type: &str,
        payload: Payload,
    ) -> Result<String, UploadError>;

    async fn file_status(&self, credential: &str, remote_id: &str)
        -> Result<FileStatus, StatusError>;

    /// Associate an uploaded file with a collection.
    async fn add_to_collection(
        &self,
        credential: &str,
        collection_id: &str,
        remote_id: &str,
    ) -> Result<(), AssignError>;
}

/// Suspends the calling task. Injected so polling can be tested without real time.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
