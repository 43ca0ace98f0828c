//! License status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activity status of a license.
///
/// Expiration is not a status: it is derived from `expires_at` so that a
/// lapsed license can be renewed without a status transition. Revocation is
/// terminal by convention, never enforced by deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "license_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// License may transact, subject to expiration and balance checks.
    Active,
    /// License is administratively paused.
    Inactive,
    /// License is permanently revoked; it never receives credit again.
    Revoked,
}

impl LicenseStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseStatus {
    type Err = tollgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "revoked" => Ok(Self::Revoked),
            _ => Err(tollgate_core::AppError::validation(format!(
                "Invalid license status: '{s}'. Expected one of: active, inactive, revoked"
            ))),
        }
    }
}
