/// `load_config` module: Loads a static YAML config and injects environment secrets into a core `SyncConfig`.
///
/// This module is the only place where untrusted YAML is parsed and mapped to strongly-typed structs.
///
/// # Responsibilities
/// - Parse the YAML file into the storage/downstream/sync sections
/// - Read secrets from the environment: `OPEN_WEBUI_API_KEY`, `BLOB_READ_WRITE_TOKEN`,
///   and the optional `OPEN_WEBUI_COLLECTION_ID` override
/// - Leave semantic validation (missing credentials, bad URLs) to `SyncConfig::validate`,
///   so those surface through the sync run's fatal-error response
///
/// # Errors
/// File read and YAML parse failures are `anyhow::Error`s surfaced at the CLI boundary.
use anyhow::Result;
use knowledge_sync_core::config::{SyncConfig, DEFAULT_CONCURRENCY};
use knowledge_sync_core::download::DEFAULT_BLOB_API_URL;
use knowledge_sync_core::policy::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DOWNSTREAM_API_KEY_VAR: &str = "OPEN_WEBUI_API_KEY";
pub const STORAGE_TOKEN_VAR: &str = "BLOB_READ_WRITE_TOKEN";
pub const COLLECTION_ID_VAR: &str = "OPEN_WEBUI_COLLECTION_ID";

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_blob_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

fn default_blob_api_url() -> String {
    DEFAULT_BLOB_API_URL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct DownstreamSection {
    pub base_url: String,
    #[serde(default)]
    pub collection_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncSection {
    pub concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub inter_attempt_delay_secs: Option<u64>,
    pub settling_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    storage: Option<StorageSection>,
    downstream: DownstreamSection,
    #[serde(default)]
    sync: SyncSection,
}

/// Loaded CLI configuration: where to list from, plus the core run config.
#[derive(Debug)]
pub struct CliConfig {
    pub storage: StorageSection,
    pub sync: SyncConfig,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let defaults = RetryPolicy::default();
    let policy = RetryPolicy {
        max_attempts: raw.sync.max_attempts.unwrap_or(defaults.max_attempts),
        inter_attempt_delay: raw
            .sync
            .inter_attempt_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.inter_attempt_delay),
        settling_delay: raw
            .sync
            .settling_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.settling_delay),
    };

    let collection_id = match std::env::var(COLLECTION_ID_VAR) {
        Ok(id) if !id.trim().is_empty() => {
            info!(collection_id = %id, "Collection id taken from environment");
            Some(id)
        }
        _ => raw.downstream.collection_id,
    };

    let sync = SyncConfig {
        downstream_base_url: raw.downstream.base_url,
        downstream_api_key: secret_from_env(DOWNSTREAM_API_KEY_VAR),
        collection_id,
        storage_token: secret_from_env(STORAGE_TOKEN_VAR),
        policy,
        concurrency: raw.sync.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        deadline: raw.sync.deadline_secs.map(Duration::from_secs),
    };

    let storage = raw.storage.unwrap_or_else(|| StorageSection {
        api_url: default_blob_api_url(),
        prefix: None,
    });

    info!(
        storage_api_url = %storage.api_url,
        downstream_base_url = %sync.downstream_base_url,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig { storage, sync })
}

fn secret_from_env(var: &str) -> String {
    match std::env::var(var) {
        Ok(value) => {
            info!(var, "Secret found in env");
            value
        }
        Err(_) => {
            warn!(var, "Secret missing from env; the sync run will reject the config");
            String::new()
        }
    }
}
