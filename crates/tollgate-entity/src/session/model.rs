//! Usage session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{SessionEndReason, SessionState};

/// An active usage session on a license.
///
/// Multiple concurrent sessions may exist for the same license key (several
/// browser tabs, for example); each is accounted independently through its
/// own heartbeats.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The license this session draws hours from.
    pub license_key: String,
    /// Lifecycle state.
    pub state: SessionState,
    /// Why the session ended, once it has.
    pub end_reason: Option<SessionEndReason>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Timestamp of the last confirmed heartbeat.
    pub last_heartbeat_at: DateTime<Utc>,
    /// When the session ended.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check whether the session is still accumulating usage.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Check whether the last heartbeat is older than the given timeout.
    pub fn is_stale_at(&self, now: DateTime<Utc>, timeout_seconds: u64) -> bool {
        self.is_active() && now - self.last_heartbeat_at > Duration::seconds(timeout_seconds as i64)
    }
}

/// Data required to create a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// The license this session belongs to.
    pub license_key: String,
    /// Session start, also the first heartbeat timestamp.
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(last_heartbeat_at: DateTime<Utc>, state: SessionState) -> Session {
        Session {
            id: Uuid::new_v4(),
            license_key: "lic_test".to_string(),
            state,
            end_reason: None,
            started_at: last_heartbeat_at,
            last_heartbeat_at,
            ended_at: None,
        }
    }

    #[test]
    fn staleness_respects_timeout() {
        let now = Utc::now();
        let fresh = session(now - Duration::seconds(30), SessionState::Active);
        let stale = session(now - Duration::seconds(120), SessionState::Active);
        assert!(!fresh.is_stale_at(now, 90));
        assert!(stale.is_stale_at(now, 90));
    }

    #[test]
    fn ended_sessions_are_never_stale() {
        let now = Utc::now();
        let ended = session(now - Duration::seconds(600), SessionState::Ended);
        assert!(!ended.is_stale_at(now, 90));
    }
}
