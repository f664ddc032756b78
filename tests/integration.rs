use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use hub_file_tools::config::ServerConfig;
use hub_file_tools::server::{AppState, build_router};

// Helper to build the router over a scratch base directory
fn app_with(configure: impl FnOnce(&mut ServerConfig)) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let mut config = ServerConfig::with_base_directory(dir.path()).unwrap();
    configure(&mut config);
    let state = AppState::from_config(&config).unwrap();
    (dir, build_router(state))
}

fn app() -> (TempDir, Router) {
    app_with(|_| {})
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// Helper to send a JSON POST and read the envelope back
async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

#[tokio::test]
async fn test_health() {
    let (_dir, router) = app();
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["hub_configured"], false);
}

#[tokio::test]
async fn test_write_list_read_scenario() {
    let (dir, router) = app();

    let (status, body) = post(
        &router,
        "/api/files/write",
        json!({"path": "packages/kitchen.yaml", "content": "light: []\n"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Wrote 10 bytes to packages/kitchen.yaml");
    assert!(dir.path().join("packages/kitchen.yaml").is_file());

    let (status, body) = post(&router, "/api/files/list", json!({"path": "packages"})).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "kitchen.yaml");
    assert_eq!(entries[0]["kind"], "file");
    assert_eq!(entries[0]["size"], 10);

    let (status, body) = post(
        &router,
        "/api/files/read",
        json!({"path": "packages/kitchen.yaml"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "light: []\n");
}

#[tokio::test]
async fn test_path_escape_is_forbidden() {
    let (_dir, router) = app();
    let (status, body) = post(
        &router,
        "/api/files/read",
        json!({"path": "../../etc/passwd"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "error": "path_escape",
            "details": "Path escapes the base directory: ../../etc/passwd"
        })
    );
}

#[tokio::test]
async fn test_aliases_are_accepted() {
    let (_dir, router) = app();

    let (status, _) = post(
        &router,
        "/api/files/write",
        json!({"file_path": "scripts.yaml", "data": "a: 1\n", "backup": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(&router, "/api/files/read", json!({"filename": "scripts.yaml"})).await;
    assert_eq!(body["data"]["content"], "a: 1\n");

    let (status, body) = post(
        &router,
        "/api/files/move",
        json!({"src": "scripts.yaml", "dest": "old/scripts.yaml"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["destination"], "old/scripts.yaml");
}

#[tokio::test]
async fn test_write_backs_up_by_default() {
    let (_dir, router) = app();
    post(
        &router,
        "/api/files/write",
        json!({"path": "configuration.yaml", "content": "old\n"}),
    )
    .await;

    let (_, body) = post(
        &router,
        "/api/files/write",
        json!({"path": "configuration.yaml", "content": "new\n"}),
    )
    .await;
    let backup = body["data"]["backup"].as_str().unwrap().to_string();
    assert!(backup.starts_with("configuration.yaml.backup_"));

    let (_, body) = post(&router, "/api/files/read", json!({"path": backup})).await;
    assert_eq!(body["data"]["content"], "old\n");
}

#[tokio::test]
async fn test_error_statuses() {
    let (_dir, router) = app();
    post(&router, "/api/files/write", json!({"path": "a.yaml", "content": "a"})).await;
    post(&router, "/api/files/write", json!({"path": "b.yaml", "content": "b"})).await;

    let (status, body) = post(&router, "/api/files/read", json!({"path": "missing.yaml"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = post(
        &router,
        "/api/files/move",
        json!({"source": "a.yaml", "destination": "b.yaml"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_exists");

    let (status, body) = post(&router, "/api/files/list", json!({"path": "a.yaml"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "not_a_directory");
}

#[tokio::test]
async fn test_malformed_body_gets_an_envelope() {
    let (_dir, router) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/files/read")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert!(status.is_client_error());
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = post(&router, "/api/files/move", json!({"source": "a"})).await;
    assert!(status.is_client_error());
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, router) = app();
    let (status, body) = get(&router, "/api/nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_tree_and_search() {
    let (_dir, router) = app();
    for path in ["automations.yaml", "packages/kitchen.yaml", "packages/deep/x/y.yaml"] {
        post(
            &router,
            "/api/files/write",
            json!({"path": path, "content": "entity_id: light.kitchen\n"}),
        )
        .await;
    }

    let (status, body) = post(&router, "/api/files/tree", json!({"depth": 1})).await;
    assert_eq!(status, StatusCode::OK);
    let children = body["data"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1]["name"], "packages");
    assert_eq!(children[1]["truncated"], true);

    let (_, body) = post(
        &router,
        "/api/files/search",
        json!({"query": "*.yaml", "recursive": false}),
    )
    .await;
    assert_eq!(body["data"]["matches"], json!(["automations.yaml"]));

    let (_, body) = post(
        &router,
        "/api/files/search_content",
        json!({"path": "packages", "pattern": "light\\.kitchen", "ext": "yaml"}),
    )
    .await;
    let matches = body["data"]["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["path"], "packages/deep/x/y.yaml");
    assert_eq!(matches[0]["line_numbers"], json!([1]));
}

#[tokio::test]
async fn test_mkdir_copy_delete() {
    let (dir, router) = app();

    for _ in 0..2 {
        let (status, _) = post(&router, "/api/files/mkdir", json!({"path": "themes"})).await;
        assert_eq!(status, StatusCode::OK);
    }

    post(
        &router,
        "/api/files/write",
        json!({"path": "themes/dark.yaml", "content": "dark: {}\n"}),
    )
    .await;
    let (status, _) = post(
        &router,
        "/api/files/copy",
        json!({"source": "themes", "destination": "themes_copy"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&router, "/api/files/delete", json!({"path": "themes_copy"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "directory");
    assert!(dir.path().join("themes/dark.yaml").is_file());

    let (status, body) = post(&router, "/api/files/info", json!({"path": "themes/dark.yaml"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["size"], 9);
}

#[tokio::test]
async fn test_hub_not_configured() {
    let (_dir, router) = app();
    let (status, body) = get(&router, "/api/hub/states").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "hub_not_configured");
}

#[tokio::test]
async fn test_hub_proxy() {
    let mut hub = mockito::Server::new_async().await;
    let state_mock = hub
        .mock("GET", "/api/states/sensor.outside")
        .match_header("authorization", "Bearer token-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"entity_id": "sensor.outside", "state": "12.5"}"#)
        .create_async()
        .await;
    let service_mock = hub
        .mock("POST", "/api/services/light/turn_off")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let url = hub.url();
    let (_dir, router) = app_with(move |config| {
        config.hub.url = Some(url);
        config.hub.token = Some("token-123".into());
    });

    let (status, body) = get(&router, "/api/hub/states/sensor.outside").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "12.5");

    let (status, body) = post(
        &router,
        "/api/hub/services/light/turn_off",
        json!({"entity_id": "light.kitchen"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Called light.turn_off");

    let (status, body) = get(&router, "/api/hub/states/not-an-entity").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    state_mock.assert_async().await;
    service_mock.assert_async().await;
}
