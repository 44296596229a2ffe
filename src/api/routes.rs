//! Dashboard route handlers.
//!
//! Thin I/O wrappers over the core components. The status endpoint always
//! returns a payload: internal failures degrade into an "unavailable"
//! snapshot rather than an error response.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::bot::{Bot, BotStatus};
use crate::captcha::InterventionState;
use crate::config::BotSettings;
use crate::session::{SessionManager, StatusSnapshot};
use crate::storage::{DataKind, JsonStorage};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub bot: Arc<Bot>,
    pub storage: JsonStorage,
    pub settings: Arc<RwLock<BotSettings>>,
}

/// Full status payload the dashboard polls.
#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    pub bot: BotStatus,
    pub session: StatusSnapshot,
    pub intervention: InterventionState,
    pub searches: usize,
    pub applications: usize,
}

/// Builds the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/start", post(start_bot))
        .route("/api/stop", post(stop_bot))
        .route("/api/recover", post(recover_session))
        .route("/api/config", get(get_config).post(update_config))
        .route("/api/searches", get(get_searches))
        .route("/api/applications", get(get_applications))
        .route("/api/logs", get(get_logs))
        .route("/api/data/:kind", delete(clear_data))
        .with_state(state)
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.manager.status().await;
    let (searches, applications) = (
        state.storage.load_searches().map(|s| s.len()).unwrap_or(0),
        state
            .storage
            .load_applications()
            .map(|a| a.len())
            .unwrap_or(0),
    );

    Json(StatusResponse {
        bot: state.bot.status(),
        session,
        intervention: state.bot.gauge().state(),
        searches,
        applications,
    })
}

async fn start_bot(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.bot.status().running {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "bot is already running"})),
        );
    }

    let bot = state.bot.clone();
    tokio::spawn(async move {
        if let Err(e) = bot.run().await {
            error!(error = %e, "background bot run failed");
        }
    });

    info!("bot started via API");
    (
        StatusCode::OK,
        Json(json!({"message": "bot started", "status": "running"})),
    )
}

async fn stop_bot(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if !state.bot.status().running {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "bot is not running"})),
        );
    }

    state.bot.request_stop();
    info!("bot stop requested via API");
    (
        StatusCode::OK,
        Json(json!({"message": "stop requested", "status": "stopping"})),
    )
}

async fn recover_session(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.manager.recover().await {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({"message": "session recovered", "session_id": session.id()})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        ),
    }
}

async fn get_config(State(state): State<AppState>) -> Json<BotSettings> {
    Json(state.settings.read().redacted())
}

async fn update_config(
    State(state): State<AppState>,
    Json(new_settings): Json<BotSettings>,
) -> (StatusCode, Json<Value>) {
    if let Err(e) = std::fs::create_dir_all(&new_settings.data_dir) {
        error!(error = %e, "failed to create data directory");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        );
    }
    let config_path = new_settings.data_dir.join("config.json");
    if let Err(e) = new_settings.save_to_file(&config_path) {
        error!(error = %e, "failed to persist configuration");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        );
    }

    *state.settings.write() = new_settings;
    info!("configuration updated via API");
    (
        StatusCode::OK,
        Json(json!({"message": "configuration updated"})),
    )
}

async fn get_searches(State(state): State<AppState>) -> Json<Value> {
    let searches = state.storage.load_searches().unwrap_or_default();
    Json(json!({"count": searches.len(), "searches": searches}))
}

async fn get_applications(State(state): State<AppState>) -> Json<Value> {
    let applications = state.storage.load_applications().unwrap_or_default();
    Json(json!({"count": applications.len(), "applications": applications}))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    #[serde(default = "default_log_limit")]
    limit: usize,
}

fn default_log_limit() -> usize {
    100
}

async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Json<Value> {
    let logs = state.storage.load_logs(query.limit).unwrap_or_default();
    Json(json!({"count": logs.len(), "logs": logs}))
}

async fn clear_data(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> (StatusCode, Json<Value>) {
    let Some(kind) = DataKind::parse(&kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("unknown data kind: {}", kind)})),
        );
    };

    match state.storage.clear(kind) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"message": "data cleared"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        ),
    }
}
