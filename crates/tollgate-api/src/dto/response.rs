//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_entity::gate::AccessDecision;
use tollgate_entity::ledger::LedgerEntry;
use tollgate_entity::license::License;
use tollgate_entity::session::Session;
use tollgate_service::HeartbeatOutcome;

/// Access check response.
///
/// Denials are answers, not errors: the response is 200 either way and the
/// reason tells the caller what to surface to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheckResponse {
    /// Whether the operation may proceed.
    pub granted: bool,
    /// Denial reason, absent when granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AccessDecision> for AccessCheckResponse {
    fn from(decision: AccessDecision) -> Self {
        Self {
            granted: decision.is_granted(),
            error: decision.deny_reason().map(|r| r.to_string()),
        }
    }
}

/// Session details response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session ID.
    pub id: Uuid,
    /// License the session runs under.
    pub license_key: String,
    /// Current state.
    pub state: String,
    /// Why the session ended, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Last heartbeat received.
    pub last_heartbeat_at: DateTime<Utc>,
    /// When the session ended, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            license_key: session.license_key,
            state: session.state.to_string(),
            end_reason: session.end_reason.map(|r| r.to_string()),
            started_at: session.started_at,
            last_heartbeat_at: session.last_heartbeat_at,
            ended_at: session.ended_at,
        }
    }
}

/// Heartbeat (and session end) response.
///
/// `status` is `"continue"` while the session stays active and `"ended"`
/// once it has been closed, with `reason` naming why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    /// Whether the client may keep going.
    pub status: String,
    /// End reason, present once the session has ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Hours debited for the elapsed interval.
    pub applied_hours: f64,
    /// Balance after the debit.
    pub balance_hours: f64,
}

impl From<HeartbeatOutcome> for HeartbeatResponse {
    fn from(outcome: HeartbeatOutcome) -> Self {
        let status = if outcome.session.is_active() {
            "continue"
        } else {
            "ended"
        };
        Self {
            status: status.to_string(),
            reason: outcome.session.end_reason.map(|r| r.to_string()),
            applied_hours: outcome.debit.applied_hours,
            balance_hours: outcome.debit.balance_hours,
        }
    }
}

/// License details response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseResponse {
    /// License key.
    pub key: String,
    /// Current status.
    pub status: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<License> for LicenseResponse {
    fn from(license: License) -> Self {
        Self {
            key: license.key,
            status: license.status.to_string(),
            expires_at: license.expires_at,
            created_at: license.created_at,
        }
    }
}

/// Hour balance response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// License key.
    pub license_key: String,
    /// Current balance.
    pub balance_hours: f64,
    /// Sessions currently drawing from this balance.
    pub active_sessions: i64,
}

/// Ledger history response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResponse {
    /// License key.
    pub license_key: String,
    /// Entries, oldest first.
    pub entries: Vec<LedgerEntry>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// License store reachability.
    pub database: String,
    /// Sessions currently being metered.
    pub active_sessions: i64,
}
