//! Watch session routes
//!
//! The front-end drives one watch session per open player view: create on
//! mount, navigate on every route change, poll for fetch/player state,
//! report iframe outcomes, and tear down on unmount.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::metrics;
use crate::models::identity::{self, RouteParams};
use crate::services::session::{SessionError, SourceOutcome};
use crate::AppState;

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateWatchResponse {
    session_id: String,
    expires_in_seconds: u64,
}

#[derive(Deserialize)]
pub struct ReportSourceRequest {
    pub outcome: SourceOutcome,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchSourceResponse {
    active_source: String,
}

fn parse_session_id(s: &str) -> Result<Uuid, (StatusCode, Json<serde_json::Value>)> {
    Uuid::parse_str(s).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid session ID format"})),
        )
    })
}

fn session_error(err: SessionError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        SessionError::NotFound => StatusCode::NOT_FOUND,
        SessionError::PlaybackUnavailable => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

/// GET /api/resolve?path=... - run the resolver alone
///
/// Diagnostic surface for the identity resolution rules; takes a raw path
/// the way the oldest route shape did.
pub async fn resolve_path(Query(query): Query<ResolveQuery>) -> impl IntoResponse {
    let params = RouteParams::RawPathOnly { path: query.path };
    let resolved = identity::resolve(&params);
    let kind = identity::kind_of(&params);
    metrics::IDENTITY_RESOLUTIONS.inc();

    Json(serde_json::json!({
        "kind": kind,
        "identity": resolved,
    }))
}

/// POST /api/watch - create a watch session
pub async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.sessions.create().await;
    Json(CreateWatchResponse {
        session_id: id.to_string(),
        expires_in_seconds: state.config.session_ttl_seconds,
    })
}

/// POST /api/watch/:id/navigate - point the session at a new route
///
/// The body is one of the three recognized route shapes; the resolved
/// canonical identity is returned immediately while the catalog lookup
/// runs in the background.
pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(params): Json<RouteParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session_id = parse_session_id(&id)?;
    let resolved = state
        .sessions
        .navigate(session_id, &params)
        .await
        .map_err(session_error)?;
    Ok(Json(resolved))
}

/// GET /api/watch/:id - poll session state
pub async fn poll_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session_id = parse_session_id(&id)?;
    let snapshot = state
        .sessions
        .snapshot(session_id)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot))
}

/// POST /api/watch/:id/source/report - iframe load signal for the active source
pub async fn report_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ReportSourceRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session_id = parse_session_id(&id)?;
    state
        .sessions
        .report_source(session_id, payload.outcome)
        .await
        .map_err(session_error)?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// POST /api/watch/:id/source/switch - explicit switch to the next provider
pub async fn switch_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session_id = parse_session_id(&id)?;
    let next = state
        .sessions
        .switch_source(session_id)
        .await
        .map_err(session_error)?;
    Ok(Json(SwitchSourceResponse {
        active_source: next.label().to_string(),
    }))
}

/// DELETE /api/watch/:id - teardown on unmount
pub async fn teardown_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let session_id = parse_session_id(&id)?;
    state
        .sessions
        .teardown(session_id)
        .await
        .map_err(session_error)?;
    Ok(Json(serde_json::json!({"success": true})))
}
