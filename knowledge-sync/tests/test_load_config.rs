use serial_test::serial;
use std::env;
use std::fs::write;
use std::time::Duration;
use tempfile::NamedTempFile;

use knowledge_sync::load_config::{
    load_config, COLLECTION_ID_VAR, DOWNSTREAM_API_KEY_VAR, STORAGE_TOKEN_VAR,
};
use knowledge_sync_core::download::DEFAULT_BLOB_API_URL;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

fn set_secrets() {
    env::set_var(DOWNSTREAM_API_KEY_VAR, "sk-webui");
    env::set_var(STORAGE_TOKEN_VAR, "vercel_blob_rw_token");
    env::remove_var(COLLECTION_ID_VAR);
}

#[test]
#[serial]
fn full_config_is_merged_with_env_secrets() {
    set_secrets();
    let file = config_file(
        r#"
storage:
  api_url: https://blob.internal.example
  prefix: handbook/
downstream:
  base_url: https://webui.example
  collection_id: kb-handbook
sync:
  concurrency: 8
  deadline_secs: 900
  max_attempts: 10
  inter_attempt_delay_secs: 2
  settling_delay_secs: 7
"#,
    );

    let config = load_config(file.path()).expect("config should load");

    assert_eq!(config.storage.api_url, "https://blob.internal.example");
    assert_eq!(config.storage.prefix.as_deref(), Some("handbook/"));
    assert_eq!(config.sync.downstream_base_url, "https://webui.example");
    assert_eq!(config.sync.downstream_api_key, "sk-webui");
    assert_eq!(config.sync.storage_token, "vercel_blob_rw_token");
    assert_eq!(config.sync.collection_target(), Some("kb-handbook"));
    assert_eq!(config.sync.concurrency, 8);
    assert_eq!(config.sync.deadline, Some(Duration::from_secs(900)));
    assert_eq!(config.sync.policy.max_attempts, 10);
    assert_eq!(config.sync.policy.inter_attempt_delay, Duration::from_secs(2));
    assert_eq!(config.sync.policy.settling_delay, Duration::from_secs(7));
    assert_eq!(config.sync.validate(), Ok(()));
}

#[test]
#[serial]
fn minimal_config_uses_defaults() {
    set_secrets();
    let file = config_file("downstream:\n  base_url: http://localhost:8080\n");

    let config = load_config(file.path()).expect("config should load");

    assert_eq!(config.storage.api_url, DEFAULT_BLOB_API_URL);
    assert_eq!(config.storage.prefix, None);
    assert_eq!(config.sync.collection_target(), None);
    assert_eq!(config.sync.concurrency, 4);
    assert_eq!(config.sync.deadline, None);
    assert_eq!(config.sync.policy.max_attempts, 6);
    assert_eq!(config.sync.policy.inter_attempt_delay, Duration::from_secs(3));
    assert_eq!(config.sync.policy.settling_delay, Duration::from_secs(5));
}

#[test]
#[serial]
fn collection_id_env_overrides_yaml() {
    set_secrets();
    env::set_var(COLLECTION_ID_VAR, "kb-from-env");
    let file = config_file(
        "downstream:\n  base_url: http://localhost:8080\n  collection_id: kb-from-yaml\n",
    );

    let config = load_config(file.path()).expect("config should load");
    env::remove_var(COLLECTION_ID_VAR);

    assert_eq!(config.sync.collection_target(), Some("kb-from-env"));
}

#[test]
#[serial]
fn missing_secrets_load_but_fail_validation() {
    env::remove_var(DOWNSTREAM_API_KEY_VAR);
    env::remove_var(STORAGE_TOKEN_VAR);
    let file = config_file("downstream:\n  base_url: http://localhost:8080\n");

    let config = load_config(file.path()).expect("loading does not check secrets");
    assert!(config.sync.downstream_api_key.is_empty());
    assert!(config.sync.validate().is_err());
}

#[test]
#[serial]
fn invalid_yaml_is_reported_as_parse_error() {
    set_secrets();
    let file = config_file("not-yaml: [:::");

    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn missing_downstream_section_is_an_error() {
    set_secrets();
    let file = config_file("storage:\n  prefix: docs/\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn missing_file_is_reported() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
