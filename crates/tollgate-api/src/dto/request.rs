//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tollgate_entity::gate::AccessIntent;

/// Access check request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccessCheckRequest {
    /// License key to check.
    #[validate(length(min = 1, message = "License key is required"))]
    pub license_key: String,
    /// What the caller wants to do.
    pub intent: AccessIntent,
}

/// Session start request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartSessionRequest {
    /// License key the session runs under.
    #[validate(length(min = 1, message = "License key is required"))]
    pub license_key: String,
}

/// License creation request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLicenseRequest {
    /// Expiration timestamp for the new license.
    pub expires_at: DateTime<Utc>,
}

/// License status change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    /// New status: active, inactive, or revoked.
    pub status: String,
}

/// License expiration change request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetExpirationRequest {
    /// New expiration timestamp, earlier or later than the current one.
    pub expires_at: DateTime<Utc>,
}

/// Manual balance adjustment request (admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustBalanceRequest {
    /// Signed hour delta to apply.
    pub delta_hours: f64,
}
