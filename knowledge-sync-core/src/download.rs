//! Object-storage side of a run: listing blobs and fetching their bytes.
//!
//! [`BlobStoreClient`] talks to a Vercel-Blob-compatible listing API and
//! implements both [`SourceLister`] and [`ContentFetcher`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::contract::{ContentFetcher, SourceItem, SourceLister};
use crate::error::{FetchError, ListingError};

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
pub const LIST_PAGE_LIMIT: usize = 1000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBlobsResponse {
    #[serde(default)]
    blobs: Vec<BlobEntry>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobEntry {
    url: String,
    pathname: String,
    size: u64,
    uploaded_at: DateTime<Utc>,
}

impl From<BlobEntry> for SourceItem {
    fn from(blob: BlobEntry) -> Self {
        SourceItem {
            path: blob.pathname,
            content_ref: blob.url,
            size_bytes: blob.size,
            last_modified: blob.uploaded_at,
        }
    }
}

pub struct BlobStoreClient {
    client: Client,
    api_url: String,
    prefix: Option<String>,
}

impl BlobStoreClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(DEFAULT_REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            prefix: None,
        })
    }

    /// Only list blobs whose pathname starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    async fn list_page(
        &self,
        credential: &str,
        cursor: Option<&str>,
    ) -> Result<ListBlobsResponse, ListingError> {
        let limit = LIST_PAGE_LIMIT.to_string();
        let mut query: Vec<(&str, &str)> = vec![("limit", limit.as_str())];
        if let Some(prefix) = self.prefix.as_deref() {
            query.push(("prefix", prefix));
        }
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = self
            .client
            .get(&self.api_url)
            .bearer_auth(credential)
            .query(&query)
            .send()
            .await
            .map_err(|e| ListingError(format!("request to {} failed: {e}", self.api_url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Blob listing API returned error");
            return Err(ListingError(format!("listing API returned HTTP {status}")));
        }

        response
            .json::<ListBlobsResponse>()
            .await
            .map_err(|e| ListingError(format!("invalid listing response: {e}")))
    }
}

#[async_trait]
impl SourceLister for BlobStoreClient {
    async fn list_items(&self, credential: &str) -> Result<Vec<SourceItem>, ListingError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.list_page(credential, cursor.as_deref()).await?;
            tracing::debug!(
                blobs = page.blobs.len(),
                has_more = page.has_more,
                "Fetched blob listing page"
            );
            items.extend(page.blobs.into_iter().map(SourceItem::from));

            match page.cursor {
                Some(next) if page.has_more && cursor.as_deref() == Some(next.as_str()) => {
                    tracing::error!(cursor = %next, "Blob listing cursor did not advance");
                    return Err(ListingError("listing cursor did not advance".into()));
                }
                Some(next) if page.has_more => cursor = Some(next),
                None if page.has_more => {
                    return Err(ListingError(
                        "listing reported more pages without a cursor".into(),
                    ))
                }
                _ => break,
            }
        }

        tracing::info!(items = items.len(), "Listed blobs from object store");
        Ok(items)
    }
}

#[async_trait]
impl ContentFetcher for BlobStoreClient {
    async fn fetch_content(&self, content_ref: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(content_ref)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %content_ref, "Blob fetch returned error");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
