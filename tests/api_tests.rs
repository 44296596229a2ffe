//! Integration tests for the dashboard API.
//!
//! Exercises the router directly with `tower::ServiceExt::oneshot`; no
//! TCP listener is involved.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use parking_lot::RwLock;
use serde_json::Value;
use tower::ServiceExt;

use seekbot::api::{create_router, AppState};
use seekbot::bot::Bot;
use seekbot::captcha::NullNotifier;
use seekbot::config::BotSettings;
use seekbot::session::{MockDriverFactory, SessionManager};
use seekbot::storage::{JsonStorage, LogRecord};

struct TestContext {
    state: AppState,
    factory: Arc<MockDriverFactory>,
    data_dir: std::path::PathBuf,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn test_context() -> TestContext {
    let data_dir = std::env::temp_dir().join(format!("seekbot-api-{}", uuid::Uuid::new_v4()));
    let storage = JsonStorage::new(&data_dir).unwrap();

    let mut settings = BotSettings::default();
    settings.user.email = "user@example.test".to_string();
    settings.user.password = "secret".to_string();
    settings.user.agreement_accepted = true;
    settings.data_dir = data_dir.clone();

    let factory = Arc::new(MockDriverFactory::new("https://example.test"));
    let manager = Arc::new(SessionManager::new(factory.clone()));
    let bot = Arc::new(Bot::new(
        settings.clone(),
        manager.clone(),
        storage.clone(),
        Arc::new(NullNotifier),
    ));

    TestContext {
        state: AppState {
            manager,
            bot,
            storage,
            settings: Arc::new(RwLock::new(settings)),
        },
        factory,
        data_dir,
    }
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn request(state: AppState, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = create_router(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn status_always_returns_a_payload() {
    let ctx = test_context();

    let (status, body) = get_json(ctx.state.clone(), "/api/status").await;
    assert_eq!(status, StatusCode::OK);

    // No session yet: still a well-formed snapshot, never an error.
    assert_eq!(body["bot"]["running"], false);
    assert_eq!(body["bot"]["current_task"], "idle");
    assert_eq!(body["session"]["alive"], false);
    assert_eq!(body["intervention"]["phase"], "idle");
}

#[tokio::test]
async fn status_reflects_a_live_session() {
    let ctx = test_context();
    ctx.state.manager.acquire().await.unwrap();

    let (status, body) = get_json(ctx.state.clone(), "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["alive"], true);
    assert_eq!(body["session"]["tab_count"], 1);
    assert_eq!(body["session"]["url"], "https://example.test");
}

#[tokio::test]
async fn config_read_redacts_the_password() {
    let ctx = test_context();

    let (status, body) = get_json(ctx.state.clone(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["password"], "***");
    assert_eq!(body["user"]["email"], "user@example.test");
}

#[tokio::test]
async fn logs_endpoint_honors_limit() {
    let ctx = test_context();
    for i in 0..5 {
        ctx.state
            .storage
            .append_log(LogRecord::new("info", format!("m{}", i)))
            .unwrap();
    }

    let (status, body) = get_json(ctx.state.clone(), "/api/logs?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["logs"][0]["message"], "m3");
}

#[tokio::test]
async fn clearing_unknown_data_kind_is_a_client_error() {
    let ctx = test_context();

    let (status, body) = request(ctx.state.clone(), "DELETE", "/api/data/bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus"));

    let (status, _body) = request(ctx.state.clone(), "DELETE", "/api/data/logs").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stop_without_a_running_bot_is_a_client_error() {
    let ctx = test_context();

    let (status, body) = request(ctx.state.clone(), "POST", "/api/stop").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not running"));
}

#[tokio::test]
async fn recover_endpoint_replaces_the_session() {
    let ctx = test_context();

    let first = ctx.state.manager.acquire().await.unwrap();
    let first_id = first.id().unwrap();
    ctx.factory.drivers()[0].set_alive(false);

    let (status, body) = request(ctx.state.clone(), "POST", "/api/recover").await;
    assert_eq!(status, StatusCode::OK);
    let new_id = body["session_id"].as_str().unwrap().to_string();
    assert_ne!(new_id, first_id);

    let (_, body) = get_json(ctx.state.clone(), "/api/status").await;
    assert_eq!(body["session"]["alive"], true);
}
