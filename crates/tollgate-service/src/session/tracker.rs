//! Session lifecycle and heartbeat-driven hour metering.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tollgate_core::config::session::SessionConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_database::repositories::{Ledger, SessionStore};
use tollgate_entity::gate::AccessIntent;
use tollgate_entity::ledger::DebitOutcome;
use tollgate_entity::session::{CreateSession, Session, SessionEndReason};

use crate::gate::service::deny_error;
use crate::gate::AccessGate;

/// Result of processing one heartbeat.
#[derive(Debug, Clone)]
pub struct HeartbeatOutcome {
    /// The session after the heartbeat (ended if the balance ran out).
    pub session: Session,
    /// The debit applied for the elapsed interval.
    pub debit: DebitOutcome,
}

/// Tracks active sessions and converts heartbeat intervals into debits.
///
/// Each heartbeat debits the wall-clock time since the previous heartbeat,
/// clamped to a few missed intervals so a client that disappears and comes
/// back hours later is not billed for the gap. A session whose debit
/// exhausts the balance is ended immediately with `BalanceExhausted`.
pub struct SessionTracker {
    sessions: Arc<dyn SessionStore>,
    ledger: Arc<dyn Ledger>,
    gate: Arc<AccessGate>,
    config: SessionConfig,
}

impl SessionTracker {
    /// Creates a new session tracker.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        ledger: Arc<dyn Ledger>,
        gate: Arc<AccessGate>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions,
            ledger,
            gate,
            config,
        }
    }

    /// Start a session for a license, subject to the access gate.
    pub async fn start(&self, key: &str, now: DateTime<Utc>) -> AppResult<Session> {
        let decision = self.gate.check(key, AccessIntent::UseService, now).await?;
        if let Some(reason) = decision.deny_reason() {
            return Err(deny_error(reason));
        }

        let session = self
            .sessions
            .create(&CreateSession {
                license_key: key.to_string(),
                started_at: now,
            })
            .await?;

        tracing::info!(session_id = %session.id, license_key = key, "Session started");
        Ok(session)
    }

    /// Debit the clamped interval between a session's previous heartbeat and
    /// `now`. The heartbeat timestamp is already advanced to `now`, so a
    /// failed debit rewinds it; the next heartbeat then bills the interval,
    /// still bounded by the clamp.
    async fn debit_interval(
        &self,
        previous: &Session,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<DebitOutcome> {
        let elapsed_seconds = (now - previous.last_heartbeat_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;
        let billable_seconds = elapsed_seconds.min(self.config.max_debit_seconds() as f64);
        let hours = billable_seconds / 3600.0;

        match self.ledger.debit_clamped(&previous.license_key, hours).await {
            Ok(debit) => Ok(debit),
            Err(err) => {
                if let Err(rewind_err) = self
                    .sessions
                    .rewind_heartbeat(id, now, previous.last_heartbeat_at)
                    .await
                {
                    tracing::warn!(
                        session_id = %id,
                        error = %rewind_err,
                        "Failed to rewind heartbeat after debit error"
                    );
                }
                Err(err)
            }
        }
    }

    /// Process a heartbeat: debit elapsed time, then end the session if the
    /// balance is exhausted.
    pub async fn heartbeat(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<HeartbeatOutcome> {
        let previous = self.sessions.record_heartbeat(id, now).await?;
        let debit = self.debit_interval(&previous, id, now).await?;

        let session = if debit.exhausted {
            let ended = self
                .sessions
                .end(id, SessionEndReason::BalanceExhausted, now)
                .await?;
            tracing::info!(
                session_id = %id,
                license_key = previous.license_key,
                "Session ended: balance exhausted"
            );
            ended
        } else {
            self.sessions
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?
        };

        Ok(HeartbeatOutcome { session, debit })
    }

    /// End a session at the client's request, debiting the final interval.
    ///
    /// Ending an already-ended session returns it unchanged with a zero
    /// debit; the original end reason stands.
    pub async fn end(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<HeartbeatOutcome> {
        let previous = match self.sessions.record_heartbeat(id, now).await {
            Ok(previous) => previous,
            Err(err) if err.kind == ErrorKind::Conflict => {
                let session = self
                    .sessions
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?;
                let balance_hours = self.ledger.balance(&session.license_key).await?;
                return Ok(HeartbeatOutcome {
                    session,
                    debit: DebitOutcome {
                        entry_id: None,
                        applied_hours: 0.0,
                        balance_hours,
                        exhausted: balance_hours <= 0.0,
                    },
                });
            }
            Err(err) => return Err(err),
        };

        let debit = self.debit_interval(&previous, id, now).await?;

        let reason = if debit.exhausted {
            SessionEndReason::BalanceExhausted
        } else {
            SessionEndReason::ClientEnded
        };
        let session = self.sessions.end(id, reason, now).await?;

        tracing::info!(session_id = %id, reason = ?reason, "Session ended");
        Ok(HeartbeatOutcome { session, debit })
    }

    /// End every active session whose last heartbeat is older than the stale
    /// timeout. Returns the number reaped.
    ///
    /// Stale sessions are not debited for the silent gap; the clamp already
    /// bounded what their final heartbeat could charge.
    pub async fn reap_stale(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let cutoff = now - chrono::Duration::seconds(self.config.stale_timeout_seconds as i64);
        let stale = self.sessions.find_stale(cutoff).await?;
        let count = stale.len();

        for session in stale {
            self.sessions
                .end(session.id, SessionEndReason::StaleTimeout, now)
                .await?;
            tracing::info!(
                session_id = %session.id,
                license_key = session.license_key,
                last_heartbeat_at = %session.last_heartbeat_at,
                "Session reaped: heartbeats stopped"
            );
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStores;
    use chrono::Duration;
    use tollgate_core::config::gate::GateConfig;
    use tollgate_core::error::ErrorKind;
    use tollgate_entity::license::LicenseStatus;
    use tollgate_entity::session::SessionState;

    fn tracker(stores: &MemoryStores) -> SessionTracker {
        let gate = Arc::new(AccessGate::new(
            stores.licenses.clone(),
            stores.ledger.clone(),
            &GateConfig::default(),
        ));
        SessionTracker::new(
            stores.sessions.clone(),
            stores.ledger.clone(),
            gate,
            SessionConfig::default(),
        )
    }

    fn far_future() -> DateTime<Utc> {
        Utc::now() + Duration::days(365)
    }

    #[tokio::test]
    async fn start_requires_gate_grant() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_empty", LicenseStatus::Active, far_future(), 0.0)
            .await;
        let tracker = tracker(&stores);

        let err = tracker.start("lic_empty", Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientBalance);

        let err = tracker.start("lic_missing", Utc::now()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn heartbeat_debits_elapsed_interval() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_a", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_a", t0).await.unwrap();

        // 30 seconds elapsed, the configured interval.
        let outcome = tracker
            .heartbeat(session.id, t0 + Duration::seconds(30))
            .await
            .unwrap();

        let expected_hours = 30.0 / 3600.0;
        assert!((outcome.debit.applied_hours - expected_hours).abs() < 1e-9);
        assert!(!outcome.debit.exhausted);
        assert_eq!(outcome.session.state, SessionState::Active);
    }

    #[tokio::test]
    async fn heartbeat_gap_is_clamped() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_b", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_b", t0).await.unwrap();

        // Client vanishes for two hours, then one heartbeat gets through.
        // Billable time is capped at interval * max_missed (30s * 3 = 90s).
        let outcome = tracker
            .heartbeat(session.id, t0 + Duration::hours(2))
            .await
            .unwrap();

        let cap_hours = 90.0 / 3600.0;
        assert!((outcome.debit.applied_hours - cap_hours).abs() < 1e-9);
    }

    #[tokio::test]
    async fn exhausting_debit_ends_session() {
        let stores = MemoryStores::new();
        // One minute of balance.
        stores
            .seed_license("lic_c", LicenseStatus::Active, far_future(), 1.0 / 60.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_c", t0).await.unwrap();

        let outcome = tracker
            .heartbeat(session.id, t0 + Duration::seconds(90))
            .await
            .unwrap();

        assert!(outcome.debit.exhausted);
        assert_eq!(outcome.debit.balance_hours, 0.0);
        assert_eq!(outcome.session.state, SessionState::Ended);
        assert_eq!(
            outcome.session.end_reason,
            Some(SessionEndReason::BalanceExhausted)
        );

        // A further heartbeat against the ended session is rejected.
        let err = tracker
            .heartbeat(session.id, t0 + Duration::seconds(120))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn zero_elapsed_heartbeat_keeps_funded_session_alive() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_z", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_z", t0).await.unwrap();

        // A heartbeat in the same instant has nothing to bill. The balance
        // is intact, so the session must stay active.
        let outcome = tracker.heartbeat(session.id, t0).await.unwrap();
        assert_eq!(outcome.debit.applied_hours, 0.0);
        assert!(!outcome.debit.exhausted);
        assert_eq!(outcome.session.state, SessionState::Active);

        // Ending immediately is a client end, not an exhaustion.
        let outcome = tracker.end(session.id, t0).await.unwrap();
        assert_eq!(outcome.debit.applied_hours, 0.0);
        assert_eq!(
            outcome.session.end_reason,
            Some(SessionEndReason::ClientEnded)
        );
    }

    #[tokio::test]
    async fn sustained_heartbeats_meter_a_full_hour() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_hour", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_hour", t0).await.unwrap();

        // One hour of on-schedule heartbeats, one every 30 seconds.
        for i in 1..=120 {
            let outcome = tracker
                .heartbeat(session.id, t0 + Duration::seconds(30 * i))
                .await
                .unwrap();
            assert_eq!(outcome.session.state, SessionState::Active);
        }

        let balance = stores.ledger.balance("lic_hour").await.unwrap();
        assert!((balance - 9.0).abs() < 1e-9);

        // The balance is exactly the sum of the ledger entries.
        let entries = stores.ledger.entries("lic_hour").await.unwrap();
        let total: f64 = entries.iter().map(|e| e.delta_hours).sum();
        assert!((balance - total).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_debit_does_not_forfeit_the_interval() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_f", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_f", t0).await.unwrap();

        stores.ledger.set_unavailable(true);
        let err = tracker
            .heartbeat(session.id, t0 + Duration::seconds(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);

        // The failed attempt rewound the heartbeat, so the next one bills
        // the whole window since the last successful debit.
        stores.ledger.set_unavailable(false);
        let outcome = tracker
            .heartbeat(session.id, t0 + Duration::seconds(45))
            .await
            .unwrap();
        assert!((outcome.debit.applied_hours - 45.0 / 3600.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn client_end_debits_final_interval() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_d", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let session = tracker.start("lic_d", t0).await.unwrap();

        let outcome = tracker
            .end(session.id, t0 + Duration::seconds(10))
            .await
            .unwrap();

        assert!((outcome.debit.applied_hours - 10.0 / 3600.0).abs() < 1e-9);
        assert_eq!(outcome.session.state, SessionState::Ended);
        assert_eq!(
            outcome.session.end_reason,
            Some(SessionEndReason::ClientEnded)
        );
    }

    #[tokio::test]
    async fn reaper_ends_stale_sessions_without_debit() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_e", LicenseStatus::Active, far_future(), 10.0)
            .await;
        let tracker = tracker(&stores);

        let t0 = Utc::now();
        let stale = tracker.start("lic_e", t0).await.unwrap();
        let fresh = tracker
            .start("lic_e", t0 + Duration::seconds(85))
            .await
            .unwrap();

        let balance_before = stores.ledger.balance("lic_e").await.unwrap();

        // Default stale timeout is 90s; only the first session has lapsed.
        let reaped = tracker
            .reap_stale(t0 + Duration::seconds(95))
            .await
            .unwrap();
        assert_eq!(reaped, 1);

        let stale = stores.sessions.find_by_id(stale.id).await.unwrap().unwrap();
        assert_eq!(stale.state, SessionState::Ended);
        assert_eq!(stale.end_reason, Some(SessionEndReason::StaleTimeout));

        let fresh = stores.sessions.find_by_id(fresh.id).await.unwrap().unwrap();
        assert_eq!(fresh.state, SessionState::Active);

        // Reaping writes no ledger entries.
        let balance_after = stores.ledger.balance("lic_e").await.unwrap();
        assert_eq!(balance_before, balance_after);
    }
}
