//! License administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use tollgate_entity::ledger::LedgerEntry;
use tollgate_entity::license::LicenseStatus;

use crate::dto::request::{
    AdjustBalanceRequest, CreateLicenseRequest, SetExpirationRequest, SetStatusRequest,
};
use crate::dto::response::{BalanceResponse, LedgerResponse, LicenseResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/licenses
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateLicenseRequest>,
) -> Result<(StatusCode, Json<LicenseResponse>), ApiError> {
    let license = state.license_service.create(req.expires_at).await?;
    Ok((StatusCode::CREATED, Json(license.into())))
}

/// GET /api/licenses
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<LicenseResponse>>, ApiError> {
    let licenses = state.license_service.list().await?;
    Ok(Json(licenses.into_iter().map(Into::into).collect()))
}

/// GET /api/licenses/{key}
pub async fn get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let license = state.license_service.get(&key).await?;
    Ok(Json(license.into()))
}

/// PATCH /api/licenses/{key}/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let status: LicenseStatus = req.status.parse()?;
    let license = state.license_service.set_status(&key, status).await?;
    Ok(Json(license.into()))
}

/// PATCH /api/licenses/{key}/expiration
pub async fn set_expiration(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetExpirationRequest>,
) -> Result<Json<LicenseResponse>, ApiError> {
    let license = state
        .license_service
        .set_expiration(&key, req.expires_at)
        .await?;
    Ok(Json(license.into()))
}

/// GET /api/licenses/{key}/balance
pub async fn balance(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance_hours = state.license_service.balance(&key).await?;
    let active_sessions = state.sessions.count_active_by_key(&key).await?;
    Ok(Json(BalanceResponse {
        license_key: key,
        balance_hours,
        active_sessions,
    }))
}

/// GET /api/licenses/{key}/ledger
pub async fn ledger(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let entries = state.license_service.ledger_entries(&key).await?;
    Ok(Json(LedgerResponse {
        license_key: key,
        entries,
    }))
}

/// POST /api/licenses/{key}/adjust
pub async fn adjust(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<AdjustBalanceRequest>,
) -> Result<Json<LedgerEntry>, ApiError> {
    let entry = state.license_service.adjust(&key, req.delta_hours).await?;
    Ok(Json(entry))
}
