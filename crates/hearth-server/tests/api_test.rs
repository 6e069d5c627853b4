//! Integration tests for the HTTP API
//!
//! Routes are exercised in-process with `oneshot`; the last tests run a real
//! listener and talk to it through the client crate.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use hearth_client::{EventBridge, HttpTaskRemote, SseBridge, TaskRemote};
use hearth_core::{HearthConfig, NewTask, RealtimeEvent, TaskType};
use hearth_server::{router, AppState, SharedState};
use hearth_storage::Database;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const SECRET: &str = "s3cret";

async fn create_test_app() -> (Router, SharedState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::open(dir.path().join("hearth.db"))
        .await
        .expect("Failed to open database");
    db.init_schema().await.expect("Failed to init schema");

    let state = Arc::new(AppState::new(db, SECRET, &HearthConfig::default()));
    (router(state.clone()), state, dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-hearth-user", "alice");
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn bearer() -> Option<&'static str> {
    Some("Bearer s3cret")
}

async fn create(app: &Router, title: &str) -> Value {
    let (status, task) = send(
        app,
        Method::POST,
        "/api/tasks",
        bearer(),
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    task
}

#[tokio::test]
async fn test_health_needs_no_secret() {
    let (app, _state, _dir) = create_test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_task_routes_require_secret() {
    let (app, _state, _dir) = create_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    // The bare secret is accepted too
    let (status, _) = send(&app, Method::GET, "/api/tasks", Some(SECRET), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_realtime_stream_requires_secret() {
    let (app, _state, _dir) = create_test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/realtime/user-household", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_create_list_and_reorder() {
    let (app, state, _dir) = create_test_app().await;
    let mut events = state.hub.subscribe(&state.channel).await;

    let first = create(&app, "Buy milk #grocery").await;
    let second = create(&app, "Fix the sink").await;
    assert_eq!(first["authorId"], "alice");
    assert_eq!(first["type"], "task");
    assert_eq!(first["position"], 1024.0);
    assert_eq!(second["position"], 2048.0);

    let created = events.recv().await.unwrap();
    assert!(matches!(created, RealtimeEvent::TaskCreated(_)));

    let (status, page) = send(&app, Method::GET, "/api/tasks?limit=1", bearer(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"][0]["title"], "Fix the sink");
    let cursor = format!("1024:{}", first["id"].as_str().unwrap());
    assert_eq!(page["nextCursor"], cursor.as_str());

    let (status, page) = send(
        &app,
        Method::GET,
        &format!("/api/tasks?limit=1&cursor={}", cursor),
        bearer(),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"][0]["title"], "Buy milk #grocery");
    assert_eq!(page["nextCursor"], Value::Null);

    let (status, body) = send(&app, Method::GET, "/api/tasks?cursor=bogus", bearer(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cursor"));

    let uri = format!("/api/tasks/{}/position", first["id"].as_str().unwrap());
    let (status, moved) = send(
        &app,
        Method::PATCH,
        &uri,
        bearer(),
        Some(json!({ "position": 3072.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["position"], 3072.0);

    let (_, page) = send(&app, Method::GET, "/api/tasks", bearer(), None).await;
    assert_eq!(page["items"][0]["title"], "Buy milk #grocery");
    assert_eq!(page["nextCursor"], Value::Null);
}

#[tokio::test]
async fn test_status_and_delete() {
    let (app, _state, _dir) = create_test_app().await;
    let task = create(&app, "Water plants").await;
    let id = task["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{}/status", id),
        bearer(),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["completed"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/tasks/{}", id), bearer(), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/tasks/{}", id), bearer(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_edit_endpoint_contract() {
    let (app, state, _dir) = create_test_app().await;
    let task = create(&app, "Old title").await;
    let uri = format!("/api/tasks/edit/{}", task["id"].as_str().unwrap());
    let body = json!({ "title": "New title", "description": "From a script" });

    let (status, response) = send(&app, Method::POST, &uri, Some("Bearer nope"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response, json!({ "error": "Unauthorized" }));

    let (status, response) = send(
        &app,
        Method::POST,
        "/api/tasks/edit/not%20an%20id",
        bearer(),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, json!({ "error": "Invalid id" }));

    let (status, response) = send(&app, Method::POST, "/api/tasks/edit", bearer(), Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, json!({ "error": "Invalid id" }));

    let (status, _) = send(&app, Method::PUT, "/api/tasks/edit/missing", bearer(), Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Malformed bodies keep the JSON error shape
    let (status, response) = send(&app, Method::POST, &uri, bearer(), Some(json!({ "title": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(response["error"].is_string());

    let mut events = state.hub.subscribe(&state.channel).await;
    let (status, response) = send(&app, Method::PUT, &uri, bearer(), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!("Task updated"));

    match events.recv().await.unwrap() {
        RealtimeEvent::ApiTaskUpdated(payload) => {
            assert_eq!(payload.task.title, "New title");
            assert_eq!(payload.task.description.as_deref(), Some("From a script"));
        }
        other => panic!("unexpected event {:?}", other),
    }

    let (status, _) = send(&app, Method::DELETE, &uri, bearer(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(
        events.recv().await.unwrap(),
        RealtimeEvent::ApiTaskDeleted(_)
    ));
}

#[tokio::test]
async fn test_shopping_routes_publish_events() {
    let (app, state, _dir) = create_test_app().await;
    let mut events = state.hub.subscribe(&state.channel).await;

    let (status, category) = send(
        &app,
        Method::POST,
        "/api/categories",
        bearer(),
        Some(json!({ "name": "Dairy" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["id"], 1);

    let (status, entry) = send(
        &app,
        Method::POST,
        "/api/catalog",
        bearer(),
        Some(json!({ "name": "Milk", "categoryId": 1, "quantity": 2, "addToList": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(events.recv().await.unwrap().name(), "new-shopping-item");

    let id = entry["id"].as_i64().unwrap();
    let (status, item) = send(
        &app,
        Method::PATCH,
        &format!("/api/shopping/{}/checked", id),
        bearer(),
        Some(json!({ "checked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["checked"], true);
    assert_eq!(events.recv().await.unwrap().name(), "shopping-item-checked");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/shopping",
        bearer(),
        Some(json!({ "catalogId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already on the shopping list"));

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/shopping/{}/quantity", id),
        bearer(),
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/catalog/by-name/Cheese", bearer(), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cleared) = send(&app, Method::DELETE, "/api/shopping", bearer(), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["removed"], 1);
    assert_eq!(events.recv().await.unwrap().name(), "shopping-items-cleared");
}

#[tokio::test]
async fn test_client_round_trip_over_http() {
    let (app, state, _dir) = create_test_app().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let remote = HttpTaskRemote::new(format!("http://{}", addr), SECRET, "bob");
    let mut bridge = SseBridge::connect(&remote, &state.channel).await.unwrap();

    let created = remote
        .create_task(&NewTask {
            title: "Call the plumber".to_string(),
            description: None,
            task_type: TaskType::Note,
        })
        .await
        .unwrap();
    assert_eq!(created.author_id, "bob");

    let event = tokio::time::timeout(Duration::from_secs(5), bridge.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, RealtimeEvent::task_created(created.clone()));

    let page = remote.fetch_page(8, None).await.unwrap();
    assert_eq!(page.items, vec![created.clone()]);

    let moved = remote.update_task_position(&created.id, 10.5).await.unwrap();
    assert_eq!(moved.position, 10.5);

    let unauthorized = HttpTaskRemote::new(format!("http://{}", addr), "wrong", "bob");
    assert_eq!(
        unauthorized.fetch_page(8, None).await,
        Err(hearth_client::MutationError::Unauthorized)
    );
}
