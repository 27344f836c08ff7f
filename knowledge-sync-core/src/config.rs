//! Run configuration for a sync: downstream endpoint and credentials, target
//! collection, retry policy, concurrency and the optional overall deadline.
//!
//! Loading from files or the environment is the caller's job; this module only
//! holds the values and checks them with [`SyncConfig::validate`].

use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::policy::RetryPolicy;

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Everything one sync run needs. Built once by the caller and passed in by reference.
#[derive(Clone)]
pub struct SyncConfig {
    pub downstream_base_url: String,
    pub downstream_api_key: String,
    /// Target collection; blank or `None` skips polling and assignment.
    pub collection_id: Option<String>,
    pub storage_token: String,
    pub policy: RetryPolicy,
    /// Per-stage bound on in-flight items.
    pub concurrency: usize,
    /// Overall run deadline, measured from the start of the run.
    pub deadline: Option<Duration>,
}

impl SyncConfig {
    pub fn new(
        downstream_base_url: impl Into<String>,
        downstream_api_key: impl Into<String>,
        storage_token: impl Into<String>,
    ) -> Self {
        Self {
            downstream_base_url: downstream_base_url.into(),
            downstream_api_key: downstream_api_key.into(),
            collection_id: None,
            storage_token: storage_token.into(),
            policy: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }

    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    pub fn collection_target(&self) -> Option<&str> {
        self.collection_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.downstream_base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        match reqwest::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(base_url.to_string())),
        }
        if self.downstream_api_key.trim().is_empty() {
            return Err(ConfigError::MissingDownstreamCredential);
        }
        if self.storage_token.trim().is_empty() {
            return Err(ConfigError::MissingStorageCredential);
        }
        if self.policy.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            downstream_base_url = %self.downstream_base_url,
            collection_id = self.collection_target().unwrap_or("<none>"),
            concurrency = self.concurrency,
            deadline_secs = self.deadline.map(|d| d.as_secs()),
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

// Credentials never reach logs.
impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("downstream_base_url", &self.downstream_base_url)
            .field("downstream_api_key", &"<redacted>")
            .field("collection_id", &self.collection_id)
            .field("storage_token", &"<redacted>")
            .field("policy", &self.policy)
            .field("concurrency", &self.concurrency)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SyncConfig {
        SyncConfig::new("http://localhost:8080", "sk-downstream", "blob-token")
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn validation_reports_the_first_missing_piece() {
        let cases = vec![
            (
                SyncConfig::new("", "k", "t"),
                ConfigError::MissingBaseUrl,
            ),
            (
                SyncConfig::new("localhost:8080/api", "k", "t"),
                ConfigError::InvalidBaseUrl("localhost:8080/api".into()),
            ),
            (
                SyncConfig::new("https://webui.example", "  ", "t"),
                ConfigError::MissingDownstreamCredential,
            ),
            (
                SyncConfig::new("https://webui.example", "k", ""),
                ConfigError::MissingStorageCredential,
            ),
            (
                SyncConfig {
                    policy: RetryPolicy {
                        max_attempts: 0,
                        ..RetryPolicy::default()
                    },
                    ..valid()
                },
                ConfigError::ZeroAttempts,
            ),
            (
                SyncConfig {
                    concurrency: 0,
                    ..valid()
                },
                ConfigError::ZeroConcurrency,
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn blank_collection_id_counts_as_unset() {
        assert_eq!(valid().with_collection("   ").collection_target(), None);
        assert_eq!(
            valid().with_collection(" kb-1 ").collection_target(),
            Some("kb-1")
        );
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("sk-downstream"));
        assert!(!rendered.contains("blob-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
