//! Local node HTTP API -- the external trigger for replication cycles.
//! Bearer token auth from ~/.mirrorcast/node-token.

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use mirrorcast_pipeline::Pipeline;
use mirrorcast_storage::FileStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for all API handlers.
pub struct AppState {
    pub pipeline: Pipeline,
    pub store: Arc<dyn FileStore>,
    pub bearer_token: String,
    pub start_time: std::time::Instant,
}

/// Build the axum router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/files/ingest", post(files_ingest))
        .route("/api/v1/files/remove", post(files_remove))
        .route("/api/v1/status", post(status))
        .with_state(state)
}

fn check_auth(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, &'static str)> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let expected = format!("Bearer {}", state.bearer_token);
    if auth != expected {
        return Err((StatusCode::UNAUTHORIZED, "invalid bearer token"));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct IngestRequest {
    /// Download link at the origin.
    pub link: String,
    /// Destination name, extension-less; the kind tag is appended.
    pub name: String,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub stored_name: String,
    pub kind: String,
    pub origin_url: String,
}

#[derive(Deserialize)]
pub struct RemoveRequest {
    pub stored_name: String,
}

async fn files_ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<IngestRequest>,
) -> impl IntoResponse {
    if let Err(e) = check_auth(&state, &headers) {
        return e.into_response();
    }

    match state.pipeline.run_cycle(&req.link, &req.name).await {
        Ok(file) => (
            StatusCode::OK,
            Json(IngestResponse {
                stored_name: file.stored_name(),
                kind: file.kind,
                origin_url: file.origin_url,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(link = %req.link, error = %e, "ingest cycle failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn files_remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RemoveRequest>,
) -> impl IntoResponse {
    if let Err(e) = check_auth(&state, &headers) {
        return e.into_response();
    }

    match state.store.exists(&req.stored_name).await {
        Ok(false) => {
            return (StatusCode::NOT_FOUND, "no such file").into_response();
        }
        Ok(true) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    }

    match state.store.remove(&req.stored_name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "removed": req.stored_name })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(e) = check_auth(&state, &headers) {
        return e.into_response();
    }

    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
    .into_response()
}
