//! Access gate handler.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use validator::Validate;

use tollgate_core::error::AppError;

use crate::dto::request::AccessCheckRequest;
use crate::dto::response::AccessCheckResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/access/check
///
/// A denial is a 200 with `granted: false`; only malformed requests and
/// infrastructure failures produce error statuses.
pub async fn check(
    State(state): State<AppState>,
    Json(req): Json<AccessCheckRequest>,
) -> Result<Json<AccessCheckResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let decision = state
        .gate
        .check(&req.license_key, req.intent, Utc::now())
        .await?;

    Ok(Json(decision.into()))
}
