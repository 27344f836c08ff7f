#![doc = "Downstream integration for the CLI: an Open WebUI client implementing the core `KnowledgeClient` trait."]
//
//! # Open WebUI client
//!
//! This module wires the [`KnowledgeClient`] abstraction from
//! `knowledge-sync-core` to a real Open WebUI instance:
//!
//! - `POST {base}/api/v1/files/`: multipart upload, returns the new file's `id`
//! - `GET {base}/api/v1/files/{id}`: processing status and extracted content
//! - `POST {base}/api/v1/knowledge/{collection}/file/add`: attach a file to a knowledge collection
//!
//! Every request carries the downstream API key as a bearer token. Transport
//! and HTTP failures are mapped onto the typed errors of the core crate.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use knowledge_sync_core::contract::{FileStatus, KnowledgeClient, Payload};
use knowledge_sync_core::error::{AssignError, StatusError, UploadError};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Processing state Open WebUI reports once extraction has finished.
const COMPLETED: &str = "completed";

#[derive(Debug, Deserialize)]
struct CreatedFile {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileRecord {
    #[serde(default)]
    data: Option<FileData>,
}

#[derive(Debug, Deserialize)]
struct FileData {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<FileRecord> for FileStatus {
    fn from(record: FileRecord) -> Self {
        let data = record.data.unwrap_or(FileData {
            status: None,
            content: None,
        });
        FileStatus {
            processed: data.status.as_deref() == Some(COMPLETED),
            has_content: data
                .content
                .as_deref()
                .is_some_and(|content| !content.trim().is_empty()),
        }
    }
}

pub struct OpenWebUiClient {
    client: Client,
    base_url: String,
}

impl OpenWebUiClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "Initialized OpenWebUiClient");
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl KnowledgeClient for OpenWebUiClient {
    async fn upload_file(
        &self,
        credential: &str,
        filename: &str,
        mime_type: &str,
        payload: Payload,
    ) -> Result<String, UploadError> {
        tracing::info!(filename, mime_type, bytes = payload.len(), "Uploading file to Open WebUI");

        let part = Part::bytes(payload.into_bytes())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| UploadError::Transport(format!("invalid MIME type {mime_type}: {e}")))?;
        // Object paths contain '/', which must reach the server as a plain filename.
        let form = Form::new().percent_encode_noop().part("file", part);

        let response = self
            .client
            .post(self.url("/api/v1/files/"))
            .bearer_auth(credential)
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(filename, status = %status, body = %body, "Open WebUI rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedFile = response.json().await.map_err(|e| {
            tracing::error!(filename, error = ?e, "Upload response was not valid JSON");
            UploadError::MissingId
        })?;
        match created.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                tracing::info!(filename, file_id = %id, "Uploaded file to Open WebUI");
                Ok(id)
            }
            None => Err(UploadError::MissingId),
        }
    }

    async fn file_status(
        &self,
        credential: &str,
        remote_id: &str,
    ) -> Result<FileStatus, StatusError> {
        let url = self.url(&format!("/api/v1/files/{remote_id}"));
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| StatusError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(file_id = remote_id, status = %status, "Open WebUI status check failed");
            return Err(StatusError(format!("HTTP {status}")));
        }

        let record: FileRecord = response
            .json()
            .await
            .map_err(|e| StatusError(format!("invalid status response: {e}")))?;
        Ok(record.into())
    }

    async fn add_to_collection(
        &self,
        credential: &str,
        collection_id: &str,
        remote_id: &str,
    ) -> Result<(), AssignError> {
        let url = self.url(&format!("/api/v1/knowledge/{collection_id}/file/add"));
        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&serde_json::json!({ "file_id": remote_id }))
            .send()
            .await
            .map_err(|e| AssignError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                file_id = remote_id,
                collection_id,
                status = %status,
                body = %body,
                "Open WebUI refused to add file to knowledge collection"
            );
            return Err(AssignError(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }
}
