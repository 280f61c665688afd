//! HTTP API handlers using axum.
//!
//! Every request carries the server paths from the active profile; the
//! manager itself stores nothing between requests.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cms_common::{
    LogOutput, LogsSnapshot, ProcessError, ServerKind, ServerPaths, ServerProcessStatus,
    SinglePathRequest, WowLaunchRequest, WowLaunchResponse,
};
use cms_server_control::{launch_wow, validate_paths, ServerControl, StartOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub control: Arc<dyn ServerControl>,
    /// Cancelled on shutdown; per-request tokens derive from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(control: Arc<dyn ServerControl>, shutdown: CancellationToken) -> Self {
        Self { control, shutdown }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/server/validate-paths", post(validate_paths_handler))
        .route("/api/server/status", post(status_all_handler))
        .route("/api/server/start", post(start_all_handler))
        .route("/api/server/stop", post(stop_all_handler))
        .route("/api/server/restart", post(restart_all_handler))
        .route("/api/server/logs", post(logs_all_handler))
        .nest("/api/realmd", server_routes(ServerKind::Realmd))
        .nest("/api/mangosd", server_routes(ServerKind::Mangosd))
        .route("/api/wow/launch", post(wow_launch_handler))
        .with_state(state)
}

/// Single-server routes, identical for realmd and mangosd.
fn server_routes(kind: ServerKind) -> Router<AppState> {
    Router::new()
        .route(
            "/status",
            post(move |state: State<AppState>, req: Json<SinglePathRequest>| {
                status_handler(kind, state, req)
            }),
        )
        .route(
            "/start",
            post(move |state: State<AppState>, req: Json<SinglePathRequest>| {
                start_handler(kind, state, req)
            }),
        )
        .route(
            "/stop",
            post(move |state: State<AppState>, req: Json<SinglePathRequest>| {
                stop_handler(kind, state, req)
            }),
        )
        .route(
            "/restart",
            post(move |state: State<AppState>, req: Json<SinglePathRequest>| {
                restart_handler(kind, state, req)
            }),
        )
        .route(
            "/logs",
            post(move |state: State<AppState>, req: Json<SinglePathRequest>| {
                logs_handler(kind, state, req)
            }),
        )
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn validate_paths_handler(Json(req): Json<ServerPaths>) -> Result<Json<ServerPaths>, ApiError> {
    validate_paths(&req)
        .map(Json)
        .map_err(|e| {
            if e.is_user_error() {
                ApiError::BadRequest(e.to_string())
            } else {
                ApiError::from(e)
            }
        })
}

async fn status_all_handler(
    State(state): State<AppState>,
    Json(req): Json<ServerPaths>,
) -> Json<Vec<ServerProcessStatus>> {
    let cancel = state.shutdown.child_token();
    Json(state.control.status_all(&req, &cancel).await)
}

async fn start_all_handler(
    State(state): State<AppState>,
    Json(req): Json<ServerPaths>,
) -> Result<Json<Vec<ServerProcessStatus>>, ApiError> {
    info!("Starting all servers");
    Ok(Json(state.control.start_all(&req).await?))
}

async fn stop_all_handler(
    State(state): State<AppState>,
    Json(req): Json<ServerPaths>,
) -> Result<Json<Vec<ServerProcessStatus>>, ApiError> {
    info!("Stopping all servers");
    Ok(Json(state.control.stop_all(&req).await?))
}

async fn restart_all_handler(
    State(state): State<AppState>,
    Json(req): Json<ServerPaths>,
) -> Result<Json<Vec<ServerProcessStatus>>, ApiError> {
    info!("Restarting all servers");
    Ok(Json(state.control.restart_all(&req).await?))
}

async fn logs_all_handler(
    State(state): State<AppState>,
    Json(req): Json<ServerPaths>,
) -> Result<Json<LogsSnapshot>, ApiError> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.control.logs_all(&req, &cancel).await?))
}

async fn status_handler(
    kind: ServerKind,
    State(state): State<AppState>,
    Json(req): Json<SinglePathRequest>,
) -> Json<ServerProcessStatus> {
    let cancel = state.shutdown.child_token();
    Json(state.control.status(kind, &req.path, &cancel).await)
}

async fn start_handler(
    kind: ServerKind,
    State(state): State<AppState>,
    Json(req): Json<SinglePathRequest>,
) -> Result<Json<ServerProcessStatus>, ApiError> {
    info!("Starting {}", kind);
    let options = StartOptions::new(req.show_console.unwrap_or(false));
    Ok(Json(state.control.start(kind, &req.path, &options).await?))
}

async fn stop_handler(
    kind: ServerKind,
    State(state): State<AppState>,
    Json(req): Json<SinglePathRequest>,
) -> Result<Json<ServerProcessStatus>, ApiError> {
    info!("Stopping {}", kind);
    Ok(Json(state.control.stop(kind, &req.path).await?))
}

async fn restart_handler(
    kind: ServerKind,
    State(state): State<AppState>,
    Json(req): Json<SinglePathRequest>,
) -> Result<Json<ServerProcessStatus>, ApiError> {
    info!("Restarting {}", kind);
    let options = StartOptions::new(req.show_console.unwrap_or(false));
    Ok(Json(state.control.restart(kind, &req.path, &options).await?))
}

async fn logs_handler(
    kind: ServerKind,
    State(state): State<AppState>,
    Json(req): Json<SinglePathRequest>,
) -> Result<Json<LogOutput>, ApiError> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.control.logs(kind, &req.path, &cancel).await?))
}

async fn wow_launch_handler(
    Json(req): Json<WowLaunchRequest>,
) -> Result<Json<WowLaunchResponse>, ApiError> {
    info!("Launching game client");
    Ok(Json(launch_wow(&req.wow_path)?))
}

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        error!("API error: {} - {}", status, message);

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
