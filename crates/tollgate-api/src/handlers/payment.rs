//! Payment webhook handler.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use tollgate_core::error::AppError;
use tollgate_entity::payment::WebhookOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/payments/webhook
///
/// The signature covers the raw body bytes, so the body is taken unparsed
/// and verified before anything touches it. Unknown licenses and duplicate
/// deliveries still answer 200 so the provider stops retrying; only a bad
/// signature gets 401.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookOutcome>, ApiError> {
    let header_name = &state.config.payment.signature_header;
    let signature = headers
        .get(header_name.as_str())
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::invalid_signature(format!("Missing {header_name} header"))
        })?;

    let outcome = state.payments.process(&body, signature).await?;
    Ok(Json(outcome))
}
