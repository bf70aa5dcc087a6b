//! HTTP surface over the in-memory backend, driven with `oneshot`

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use commerce_server::crypto::{Bcrypt, MIN_COST};
use commerce_server::db::{ConnectionProvider, MemoryDatabase};
use commerce_server::http::{router, serve, AppState, ServerConfig};
use commerce_server::service::AuthService;
use commerce_server::store::MemoryUserStore;
use commerce_server::transaction::TransactionManager;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn state(db: &MemoryDatabase, config: &ServerConfig) -> AppState {
    let auth = AuthService::new(
        TransactionManager::new(db.clone()),
        MemoryUserStore::new(db.clone()),
        Arc::new(Bcrypt::new(MIN_COST).unwrap()),
    );
    AppState::new(Arc::new(auth), Arc::new(db.clone()), config.handler_timeout)
}

fn app() -> (Router, MemoryDatabase) {
    let db = MemoryDatabase::new();
    let config = ServerConfig::default();
    (router(state(&db, &config), &config), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body(email: &str) -> Value {
    json!({ "name": "Barbara Liskov", "email": email, "password": "substitution" })
}

#[tokio::test]
async fn health_reports_provider_state() {
    let (app, db) = app();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "ok");
    assert_eq!(body["data"]["status"], "ok");

    db.disconnect().await.unwrap();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["status"], "unavailable");
}

#[tokio::test]
async fn register_returns_201_then_409_for_same_email() {
    let (app, db) = app();

    let (status, body) = send(
        &app,
        post_json("/api/v1/auth/register", register_body("barbara@mit.edu")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "user registered");
    assert_eq!(body["data"]["email"], "barbara@mit.edu");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = send(
        &app,
        post_json("/api/v1/auth/register", register_body("Barbara@MIT.edu")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "user with this email already exists");
    assert_eq!(db.user_count(), 1);
}

#[tokio::test]
async fn invalid_registration_is_400_with_problem_map() {
    let (app, db) = app();

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/register",
            json!({ "name": "", "email": "nope", "password": "" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "validation failed");
    assert_eq!(body["data"]["email"], "must be a valid email address");
    assert_eq!(body["data"]["name"], "must not be empty");
    assert_eq!(db.stats().begun, 0);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let (app, _db) = app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("malformed request body"));
}

#[tokio::test]
async fn login_success_and_symmetric_failures() {
    let (app, _db) = app();
    send(
        &app,
        post_json("/api/v1/auth/register", register_body("barbara@mit.edu")),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "barbara@mit.edu", "password": "substitution" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "barbara@mit.edu");

    let (wrong_status, wrong_body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "barbara@mit.edu", "password": "inheritance" }),
        ),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            json!({ "email": "nobody@mit.edu", "password": "substitution" }),
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn diagnostic_hello() {
    let (app, _db) = app();

    let (status, body) = send(&app, get("/api/v1/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "hello, world", "data": null }));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_returns_503_with_configured_message() {
    let db = MemoryDatabase::new();
    let config = ServerConfig {
        handler_timeout: Duration::from_secs(1),
        timeout_message: "the kitchen is slow today".into(),
        ..ServerConfig::default()
    };
    let app = router(state(&db, &config), &config);

    let (status, body) = send(&app, get("/api/v1/test/timeout")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "the kitchen is slow today");
}

#[tokio::test]
async fn serve_disconnects_provider_after_shutdown() {
    let db = MemoryDatabase::new();
    let config = ServerConfig {
        shutdown_grace: Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(serve(listener, state(&db, &config), config, async move {
        let _ = stop_rx.await;
    }));

    assert!(db.check_health().await.unwrap());
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();

    assert!(!db.check_health().await.unwrap());
}
