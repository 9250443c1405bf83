use axum::Router;
use axum::http::{Request, StatusCode};
use axum::body::Body;
use serde_json::{json, Value};
use service::storage::{MemoryRecordStore, RecordFields};
use service::StoreOptions;
use tower::Service;

use server::routes::ServerState;

fn build_app_with(options: StoreOptions, required: Vec<String>) -> Router {
    let store = MemoryRecordStore::new(options);
    server::startup::app(ServerState::new(store, required))
}

fn build_app() -> Router {
    build_app_with(StoreOptions::default(), Vec::new())
}

async fn post(app: &Router, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?;
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, value))
}

#[tokio::test]
async fn register_login_save_scenario() -> anyhow::Result<()> {
    let app = build_app();

    // Register
    let doc = json!({"username": "alice", "credential": "p1", "farm_name": "Green"});
    let (status, body) = post(&app, "/register", doc.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], doc);

    // Login
    let (status, body) = post(&app, "/login", json!({"username": "alice", "credential": "p1"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], doc);

    // Wrong password
    let (status, body) = post(&app, "/login", json!({"username": "alice", "credential": "wrong"})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "InvalidCredential");
    assert_eq!(body["code"], 1004);

    // Save replaces the whole document
    let saved = json!({"username": "alice", "credential": "p1", "money": 500});
    let (status, body) = post(&app, "/save", saved.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], saved);

    let (status, body) = post(&app, "/login", json!({"username": "alice", "credential": "p1"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], saved);
    assert!(body["data"].get("farm_name").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_register_conflicts() -> anyhow::Result<()> {
    let app = build_app();
    let first = json!({"username": "bob", "credential": "p1"});
    assert_eq!(post(&app, "/register", first.clone()).await?.0, StatusCode::OK);

    let (status, body) = post(&app, "/register", json!({"username": "bob", "credential": "p2"})).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyExists");

    let (_, body) = post(&app, "/login", json!({"username": "bob", "credential": "p1"})).await?;
    assert_eq!(body["data"], first);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_bad_requests() -> anyhow::Result<()> {
    let app = build_app();
    for (uri, body) in [
        ("/register", json!({"credential": "p1"})),
        ("/register", json!({"username": "carol"})),
        ("/login", json!({"username": "carol"})),
        ("/login", json!({"credential": "p1"})),
        ("/save", json!({"money": 5})),
        ("/save", json!({"username": ""})),
        ("/register", json!({"username": "../../etc/passwd", "credential": "x"})),
    ] {
        let (status, resp) = post(&app, uri, body.clone()).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
        assert_eq!(resp["error"], "InvalidInput");
    }

    let req = Request::builder()
        .method("POST")
        .uri("/save")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let (status, resp) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["code"], 1001);
    Ok(())
}

#[tokio::test]
async fn login_unknown_user_is_not_found() -> anyhow::Result<()> {
    let app = build_app();
    let (status, body) = post(&app, "/login", json!({"username": "ghost", "credential": "x"})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    Ok(())
}

#[tokio::test]
async fn legacy_routes_and_field_names() -> anyhow::Result<()> {
    let options = StoreOptions {
        fields: RecordFields::new("user_name", "user_password"),
        ..StoreOptions::default()
    };
    let app = build_app_with(options, vec!["farm_name".to_string()]);

    // farm_name is required at registration
    let (status, _) = post(&app, "/register", json!({"user_name": "小明", "user_password": "pw"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let doc = json!({"user_name": "小明", "user_password": "pw", "farm_name": "萌芽农场"});
    assert_eq!(post(&app, "/register", doc.clone()).await?.0, StatusCode::OK);

    let saved = json!({"user_name": "小明", "user_password": "pw", "money": 10, "level": 2, "experience": 30});
    assert_eq!(post(&app, "/save_game", saved.clone()).await?.0, StatusCode::OK);

    let (status, body) = post(&app, "/load_game", json!({"user_name": "小明", "user_password": "pw"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], saved);
    Ok(())
}

#[tokio::test]
async fn health_and_metrics() -> anyhow::Result<()> {
    let app = build_app();
    let req = Request::builder().uri("/health").body(Body::empty())?;
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    post(&app, "/register", json!({"username": "metric_user", "credential": "p"})).await?;
    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let resp = app.clone().call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(axum::body::to_bytes(resp.into_body(), usize::MAX).await?.to_vec())?;
    assert!(text.contains("farm_saves_requests_total"), "{text}");
    assert!(text.contains("action=\"register\""), "{text}");
    Ok(())
}
