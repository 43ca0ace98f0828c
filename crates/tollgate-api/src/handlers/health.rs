//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health/detailed
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    // One store round trip covers both the reachability probe and the counter.
    let (status, database, active_sessions) = match state.sessions.count_active().await {
        Ok(count) => ("ok", "connected", count),
        Err(e) => {
            tracing::error!("Health check could not reach the session store: {}", e);
            ("degraded", "unreachable", 0)
        }
    };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        database: database.to_string(),
        active_sessions,
    })
}
