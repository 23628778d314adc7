//! Integration tests for the control-plane client using a mock server

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ycprov_core::cloud::params::CreateDatabaseRequest;
use ycprov_core::cloud::{self, CloudClient};
use ycprov_core::config::{Endpoints, ProvisioningConfig};
use ycprov_core::{
    BatchRunner, CoreError, OperationApi, RetryPolicy, SweepOptions, WaitOptions, fetch_status,
    wait_for_operation,
};

fn client_for(server: &MockServer) -> CloudClient {
    CloudClient::new("t1.test-token", Endpoints::all(&server.uri())).unwrap()
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(5),
    }
}

fn fast_wait() -> WaitOptions {
    WaitOptions {
        retry: fast_retry(),
        interval: Duration::from_millis(10),
        timeout: Duration::from_secs(10),
    }
}

fn fast_sweep() -> SweepOptions {
    SweepOptions {
        retry: fast_retry(),
        pacing: Duration::from_millis(10),
        max_age: None,
    }
}

async fn mount_done(server: &MockServer, op_id: &str, response: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/operations/{}", op_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": op_id,
            "done": true,
            "response": response
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Operation status reads
// ============================================================================

#[tokio::test]
async fn test_get_operation_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .and(header("authorization", "Bearer t1.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "op-1",
            "description": "Create database",
            "createdAt": "2025-03-01T10:00:00Z",
            "done": false,
            "metadata": {"databaseId": "etn-1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = client_for(&server).get_operation("op-1").await.unwrap();

    assert_eq!(op.id, "op-1");
    assert!(!op.done);
    assert!(op.created_at.is_some());
}

#[tokio::test]
async fn test_fetch_status_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_done(&server, "op-1", json!({"id": "etn-1"})).await;

    let op = fetch_status(&client_for(&server), "op-1", &fast_retry())
        .await
        .unwrap();

    assert!(op.done);
    assert_eq!(op.resource_id(), Some("etn-1"));
}

#[tokio::test]
async fn test_fetch_status_gives_up_after_five_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(5)
        .mount(&server)
        .await;

    let err = fetch_status(&client_for(&server), "op-1", &fast_retry())
        .await
        .unwrap_err();

    match err {
        CoreError::Transport {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 5);
            assert_eq!(source.status, Some(502));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_for_operation_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-1", "done": false})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_done(&server, "op-1", json!({"id": "folder-1"})).await;

    let response = wait_for_operation(
        &client_for(&server),
        "op-1",
        "folder creation for alice",
        &fast_wait(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(response, json!({"id": "folder-1"}));
}

// ============================================================================
// Start calls
// ============================================================================

#[tokio::test]
async fn test_start_database_creation_posts_dedicated_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/databases"))
        .and(body_partial_json(json!({
            "folderId": "folder-1",
            "name": "ydb-alice",
            "dedicatedDatabase": {
                "resourcePresetId": "small-m8",
                "networkId": "net-1",
                "assignPublicIps": false
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-db", "done": false})))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateDatabaseRequest::dedicated(
        "folder-1",
        "ydb-alice",
        "YDB database for folder alice",
        "net-1",
        &["s-a".to_string()],
        &ProvisioningConfig::default(),
    )
    .unwrap();
    let handle = client_for(&server)
        .start_database_creation(&request)
        .await
        .unwrap();

    assert_eq!(handle.operation_id(), "op-db");
    assert_eq!(handle.description(), "YDB database creation for ydb-alice");
}

#[tokio::test]
async fn test_inline_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 6, "message": "folder already exists"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .start_folder_creation("b1gcloud", "alice-baggins", None)
        .await
        .unwrap_err();

    match err {
        CoreError::Rejected { code, message, .. } => {
            assert_eq!(code, 6);
            assert_eq!(message, "folder already exists");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_without_operation_id_is_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/databases/etn-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": false})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .start_database_deletion("etn-1")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::MissingField { ref field, .. } if field == "id"));
}

#[tokio::test]
async fn test_http_error_status_is_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/idp/users:generatePassword"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate_password().await.unwrap_err();

    match err {
        CoreError::Request { source, .. } => {
            assert_eq!(source.status, Some(403));
            assert!(source.message.contains("permission denied"));
        }
        other => panic!("expected request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_password_reads_password_spec() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/idp/users:generatePassword"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "passwordSpec": {"password": "Xy7!pass", "generationProof": "proof-1"}
        })))
        .mount(&server)
        .await;

    let spec = client_for(&server).generate_password().await.unwrap();

    assert_eq!(spec.password, "Xy7!pass");
    assert_eq!(spec.generation_proof, "proof-1");
}

// ============================================================================
// List calls
// ============================================================================

#[tokio::test]
async fn test_list_databases_follows_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/databases"))
        .and(query_param("folderId", "folder-1"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "databases": [{"id": "etn-1", "name": "one"}],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/databases"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "databases": [{
                "id": "etn-2",
                "name": "two",
                "storageConfig": {"storageOptions": [{"storageTypeId": "ssd", "groupCount": "2"}]}
            }]
        })))
        .mount(&server)
        .await;

    let databases = client_for(&server).list_databases("folder-1").await.unwrap();

    let ids: Vec<_> = databases.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["etn-1", "etn-2"]);
    assert!(cloud::has_dedicated_storage(&databases));
}

#[tokio::test]
async fn test_list_without_items_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let folders = client_for(&server).list_folders("b1gcloud").await.unwrap();

    assert!(folders.is_empty());
}

// ============================================================================
// Workflows
// ============================================================================

#[tokio::test]
async fn test_create_folder_and_wait_returns_folder_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/folders"))
        .and(body_partial_json(json!({
            "cloudId": "b1gcloud",
            "name": "frodo-baggins",
            "description": "Personal folder for user Frodo Baggins"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-f", "done": false})))
        .mount(&server)
        .await;
    mount_done(&server, "op-f", json!({"id": "b1gfolder"})).await;

    let folder_id = cloud::create_folder_and_wait(
        &client_for(&server),
        "b1gcloud",
        "frodo-baggins",
        Some("Personal folder for user Frodo Baggins"),
        &fast_wait(),
    )
    .await
    .unwrap();

    assert_eq!(folder_id, "b1gfolder");
}

#[tokio::test]
async fn test_grant_cloud_access_surfaces_operation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clouds/b1gcloud:updateAccessBindings"))
        .and(body_partial_json(json!({
            "accessBindingDeltas": [{"action": "ADD"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-g", "done": false})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/op-g"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "op-g",
            "done": true,
            "error": {"code": 7, "message": "Permission denied"}
        })))
        .mount(&server)
        .await;

    let err = cloud::grant_cloud_access_and_wait(
        &client_for(&server),
        "b1gcloud",
        "user-1",
        "resource-manager.clouds.member",
        &fast_wait(),
    )
    .await
    .unwrap_err();

    assert!(err.is_operation_failure());
    assert_eq!(err.remote_code(), Some(7));
}

#[tokio::test]
async fn test_ensure_vpc_reuses_complete_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/networks"))
        .and(query_param("folderId", "folder-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networks": [{"id": "net-1", "name": "default"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/networks/net-1/subnets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subnets": [
                {"id": "s-a", "zoneId": "ru-central1-a"},
                {"id": "s-b", "zoneId": "ru-central1-b"},
                {"id": "s-d", "zoneId": "ru-central1-d"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/networks"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let vpc = cloud::ensure_vpc(
        &client_for(&server),
        "folder-1",
        "alice",
        &ProvisioningConfig::default(),
        &fast_wait(),
    )
    .await
    .unwrap();

    assert_eq!(vpc.network_id, "net-1");
    assert_eq!(vpc.subnet_ids, vec!["s-a", "s-b", "s-d"]);
    assert!(!vpc.created);
}

#[tokio::test]
async fn test_ensure_vpc_creates_network_and_subnets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"networks": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/networks"))
        .and(body_partial_json(json!({"name": "vpc-alice"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "op-net"})))
        .mount(&server)
        .await;
    mount_done(&server, "op-net", json!({"id": "net-new"})).await;
    for (i, zone) in ["ru-central1-a", "ru-central1-b", "ru-central1-d"]
        .into_iter()
        .enumerate()
    {
        Mock::given(method("POST"))
            .and(path("/subnets"))
            .and(body_partial_json(json!({
                "networkId": "net-new",
                "zoneId": zone,
                "v4CidrBlocks": [format!("192.168.{}.0/24", i + 1)]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": format!("op-sub-{}", i)})),
            )
            .mount(&server)
            .await;
        mount_done(&server, &format!("op-sub-{}", i), json!({"id": format!("subnet-{}", i)})).await;
    }

    let vpc = cloud::ensure_vpc(
        &client_for(&server),
        "folder-1",
        "alice",
        &ProvisioningConfig::default(),
        &fast_wait(),
    )
    .await
    .unwrap();

    assert!(vpc.created);
    assert_eq!(vpc.network_id, "net-new");
    assert_eq!(vpc.subnet_ids, vec!["subnet-0", "subnet-1", "subnet-2"]);
}

// ============================================================================
// Batch runner end to end
// ============================================================================

#[tokio::test]
async fn test_batch_runner_drives_deletions() {
    let server = MockServer::start().await;
    for db in ["etn-1", "etn-2", "etn-3"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/databases/{}", db)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": format!("op-{}", db)})),
            )
            .mount(&server)
            .await;
    }
    mount_done(&server, "op-etn-1", json!({})).await;
    mount_done(&server, "op-etn-2", json!({})).await;
    Mock::given(method("GET"))
        .and(path("/operations/op-etn-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "op-etn-3",
            "done": true,
            "error": {"code": 9, "message": "database is busy"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut runner = BatchRunner::new(&client, "database deletion", 2, fast_sweep());
    for db in ["etn-1", "etn-2", "etn-3", "etn-missing"] {
        let _ = runner.start(|| client.start_database_deletion(db)).await;
        assert!(runner.in_flight() <= 2);
    }
    let summary = runner.finish().await;

    assert_eq!(summary.started, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.start_failures, 1);
}
