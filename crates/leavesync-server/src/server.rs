use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use leavesync_core::SyncError;
use leavesync_sync::{CallbackHandler, CycleOutcome, SyncEngine};

use crate::error::ApiError;
use crate::types::{CallbackParams, ToggleResponse, TriggerResponse};

pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub callback: Arc<CallbackHandler>,
}

/// Builds the router with permissive CORS, mirroring the origin-agnostic
/// policy a small internal sync service needs when its dashboard and API
/// are served from different ports.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/callback", get(verify_callback_url).post(handle_callback_event))
        .route("/api/sync/status", get(sync_status))
        .route("/api/sync/start", post(start_sync))
        .route("/api/sync/stop", post(stop_sync))
        .route("/api/sync/reset-cursor", post(reset_cursor))
        .route("/api/sync/trigger", post(trigger_sync))
        .route("/api/status-check/start", post(start_status_check))
        .route("/api/status-check/stop", post(stop_status_check))
        .route("/api/status-check/trigger", post(trigger_status_check))
        .route("/api/approvals/active", get(active_approvals))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn verify_callback_url(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    match state.callback.verify_url(
        &params.msg_signature,
        &params.timestamp,
        &params.nonce,
        &params.echostr,
    ) {
        Ok(plaintext) => (StatusCode::OK, plaintext).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid callback verification request").into_response(),
    }
}

async fn handle_callback_event(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    body: String,
) -> impl IntoResponse {
    let result = state
        .callback
        .handle_event(&params.msg_signature, &params.timestamp, &params.nonce, &body)
        .await;
    (StatusCode::OK, result)
}

async fn sync_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let status = state.engine.status().await?;
    Ok(Json(status))
}

async fn start_sync(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.set_auto_sync_enabled(true);
    Json(ToggleResponse { enabled: true })
}

async fn stop_sync(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.set_auto_sync_enabled(false);
    Json(ToggleResponse { enabled: false })
}

async fn start_status_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.set_status_check_enabled(true);
    Json(ToggleResponse { enabled: true })
}

async fn stop_status_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.set_status_check_enabled(false);
    Json(ToggleResponse { enabled: false })
}

async fn reset_cursor(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.engine.reset_cursor().await?;
    Ok(Json(TriggerResponse {
        outcome: "cursor_reset".to_string(),
    }))
}

async fn trigger_sync(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.engine.check_manual_trigger_spacing().await?;
    let outcome = leavesync_sync::run_incremental_cycle(&state.engine).await?;
    match outcome {
        CycleOutcome::LockBusy => Err(ApiError(SyncError::LockBusy)),
        CycleOutcome::NothingToDo => Ok(Json(TriggerResponse {
            outcome: "nothing_to_do".to_string(),
        })),
        CycleOutcome::Completed { fetched, processed } => Ok(Json(TriggerResponse {
            outcome: format!("completed: fetched {fetched}, processed {processed}"),
        })),
    }
}

async fn trigger_status_check(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let outcome = leavesync_sync::run_status_check_cycle(&state.engine).await?;
    match outcome {
        leavesync_sync::CheckOutcome::LockBusy => Err(ApiError(SyncError::LockBusy)),
        leavesync_sync::CheckOutcome::IndexEmpty => Ok(Json(TriggerResponse {
            outcome: "index_empty".to_string(),
        })),
        leavesync_sync::CheckOutcome::Completed { checked, changed } => Ok(Json(TriggerResponse {
            outcome: format!("completed: checked {checked}, changed {changed}"),
        })),
    }
}

async fn active_approvals(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let approvals = state.engine.active_approvals().await?;
    Ok(Json(approvals))
}
