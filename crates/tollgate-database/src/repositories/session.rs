//! Session store trait and Postgres implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_entity::session::{CreateSession, Session, SessionEndReason, SessionState};

/// Persistence for usage sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Create a new active session.
    async fn create(&self, session: &CreateSession) -> AppResult<Session>;

    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Record a heartbeat and return the previous heartbeat timestamp.
    ///
    /// Fails with a conflict if the session is not active.
    async fn record_heartbeat(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Session>;

    /// Restore a heartbeat timestamp from `from` back to `to`.
    ///
    /// Used when the debit for a recorded heartbeat fails, so the next
    /// heartbeat bills the interval instead of losing it. The update is
    /// conditional: it only applies while the session is active and still
    /// carries the `from` timestamp, so a newer heartbeat is never clobbered.
    async fn rewind_heartbeat(
        &self,
        id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Transition an active session to ended with the given reason.
    ///
    /// Ending an already-ended session is a no-op that returns the session
    /// as stored; the first end reason wins.
    async fn end(&self, id: Uuid, reason: SessionEndReason, at: DateTime<Utc>)
        -> AppResult<Session>;

    /// Active sessions whose last heartbeat is at or before `cutoff`.
    async fn find_stale(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Session>>;

    /// Number of currently active sessions for a license key.
    async fn count_active_by_key(&self, key: &str) -> AppResult<i64>;

    /// Number of currently active sessions across all licenses.
    async fn count_active(&self) -> AppResult<i64>;
}

/// Postgres-backed session store.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &CreateSession) -> AppResult<Session> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, license_key, state, started_at, last_heartbeat_at) \
             VALUES ($1, $2, 'active', $3, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&session.license_key)
        .bind(session.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn record_heartbeat(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Session> {
        // Returns the pre-update row so the caller can compute elapsed time
        // from the previous heartbeat.
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let previous = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock session", e))?
        .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?;

        if previous.state != SessionState::Active {
            return Err(AppError::new(
                ErrorKind::Conflict,
                format!("Session '{id}' is not active"),
            ));
        }

        sqlx::query("UPDATE sessions SET last_heartbeat_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record heartbeat", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;

        Ok(previous)
    }

    async fn rewind_heartbeat(
        &self,
        id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET last_heartbeat_at = $3 \
             WHERE id = $1 AND last_heartbeat_at = $2 AND state = 'active'",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rewind heartbeat", e)
        })?;
        Ok(())
    }

    async fn end(
        &self,
        id: Uuid,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let ended = sqlx::query_as::<_, Session>(
            "UPDATE sessions SET state = 'ended', end_reason = $2, ended_at = $3 \
             WHERE id = $1 AND state = 'active' RETURNING *",
        )
        .bind(id)
        .bind(reason)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to end session", e))?;

        match ended {
            Some(session) => Ok(session),
            // Already ended; first reason wins.
            None => self
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found"))),
        }
    }

    async fn find_stale(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE state = 'active' AND last_heartbeat_at <= $1 \
             ORDER BY last_heartbeat_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to query stale sessions", e)
        })
    }

    async fn count_active_by_key(&self, key: &str) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions WHERE license_key = $1 AND state = 'active'",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count active sessions", e)
        })
    }

    async fn count_active(&self) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sessions WHERE state = 'active'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count active sessions", e)
            })
    }
}
