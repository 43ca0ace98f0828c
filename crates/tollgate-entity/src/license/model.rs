//! License entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::LicenseStatus;

/// A prepaid, time-denominated license.
///
/// The hour balance is deliberately absent from this struct: it is always
/// derived from the ledger (or its materialized running total), never stored
/// as a mutable field that can drift.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct License {
    /// Opaque, unique, immutable license key.
    pub key: String,
    /// Current activity status.
    pub status: LicenseStatus,
    /// Absolute expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// When the license was provisioned.
    pub created_at: DateTime<Utc>,
}

impl License {
    /// Check whether the license has passed its expiration date.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Check whether the license status is Active.
    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    /// Check whether the license has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.status == LicenseStatus::Revoked
    }
}
