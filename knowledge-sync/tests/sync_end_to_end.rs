use serde_json::{json, Value};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use knowledge_sync::cli::{run, Cli, Commands};
use knowledge_sync::load_config::{COLLECTION_ID_VAR, DOWNSTREAM_API_KEY_VAR, STORAGE_TOKEN_VAR};

/// One server plays both the blob store and Open WebUI.
async fn mount_services(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Bearer blob-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blobs": [
                {
                    "url": format!("{}/blobs/guide.md", server.uri()),
                    "pathname": "guide.md",
                    "size": 7,
                    "uploadedAt": "2024-04-01T09:30:00.000Z"
                },
                {
                    "url": format!("{}/blobs/lost.pdf", server.uri()),
                    "pathname": "lost.pdf",
                    "size": 99,
                    "uploadedAt": "2024-04-02T09:30:00.000Z"
                }
            ],
            "hasMore": false
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blobs/guide.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Guide"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blobs/lost.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/"))
        .and(header("authorization", "Bearer sk-webui"))
        .and(body_string_contains("filename=\"guide.md\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-guide" })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/files/file-guide"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-guide",
            "data": { "status": "completed", "content": "Guide" }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/knowledge/kb-docs/file/add"))
        .and(body_json(json!({ "file_id": "file-guide" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "kb-docs" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
#[serial]
async fn sync_uploads_polls_assigns_and_writes_report() {
    let server = MockServer::start().await;
    mount_services(&server).await;

    env::set_var(DOWNSTREAM_API_KEY_VAR, "sk-webui");
    env::set_var(STORAGE_TOKEN_VAR, "blob-token");
    env::remove_var(COLLECTION_ID_VAR);

    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("sync.yaml");
    let report_path = dir.path().join("report.json");
    fs::write(
        &config_path,
        format!(
            "storage:\n  api_url: {uri}\ndownstream:\n  base_url: {uri}\nsync:\n  settling_delay_secs: 0\n  inter_attempt_delay_secs: 0\n",
            uri = server.uri()
        ),
    )
    .expect("write config");

    let cli = Cli {
        command: Commands::Sync {
            config: config_path,
            collection_id: Some("kb-docs".into()),
            output: Some(report_path.clone()),
        },
    };
    run(cli).await.expect("sync should succeed");

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report written"))
            .expect("report is JSON");

    assert_eq!(report["totalFiles"], 2);
    assert_eq!(report["successful"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["addedToCollection"], 1);

    assert_eq!(report["results"][0]["file"], "guide.md");
    assert_eq!(report["results"][0]["status"], "uploaded");
    assert_eq!(report["results"][0]["openWebUIId"], "file-guide");
    assert_eq!(report["results"][0]["collectionStatus"], "added");
    assert_eq!(report["results"][0]["size"], 7);
    assert_eq!(report["results"][0]["uploadedAt"], "2024-04-01T09:30:00Z");

    assert_eq!(report["results"][1]["file"], "lost.pdf");
    assert_eq!(report["results"][1]["status"], "upload-failed");
    assert!(report["results"][1]["collectionStatus"].is_null());
    assert_eq!(report["errors"][0]["file"], "lost.pdf");
    assert_eq!(report["errors"][0]["error"], "content fetch returned HTTP 404");
}
