//! Session lifecycle handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use tollgate_core::error::AppError;

use crate::dto::request::StartSessionRequest;
use crate::dto::response::{HeartbeatResponse, SessionResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/sessions
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let session = state.tracker.start(&req.license_key, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /api/sessions/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?;
    Ok(Json(session.into()))
}

/// POST /api/sessions/{id}/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let outcome = state.tracker.heartbeat(id, Utc::now()).await?;
    Ok(Json(outcome.into()))
}

/// POST /api/sessions/{id}/end
pub async fn end(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let outcome = state.tracker.end(id, Utc::now()).await?;
    Ok(Json(outcome.into()))
}
