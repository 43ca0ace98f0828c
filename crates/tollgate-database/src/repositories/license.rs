//! License store trait and Postgres implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_entity::license::{License, LicenseStatus};

/// Durable record of license status, expiration, and identity.
///
/// Reads must reflect the latest committed write; implementations surface
/// unreachability as an error, never a silent default.
#[async_trait]
pub trait LicenseStore: Send + Sync + 'static {
    /// Find a license by key.
    async fn find_by_key(&self, key: &str) -> AppResult<Option<License>>;

    /// Provision a license with the given key and expiration.
    ///
    /// Also creates the zero-hour balance row in the same transaction so the
    /// ledger's per-key lock target exists from the start.
    async fn create(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<License>;

    /// Update the activity status.
    async fn set_status(&self, key: &str, status: LicenseStatus) -> AppResult<()>;

    /// Update the expiration timestamp.
    async fn set_expiration(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<()>;

    /// All licenses, newest first.
    async fn list(&self) -> AppResult<Vec<License>>;
}

/// Postgres-backed license store.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: PgPool,
}

impl PgLicenseStore {
    /// Create a new license store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LicenseStore for PgLicenseStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find license", e))
    }

    async fn create(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<License> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let license = sqlx::query_as::<_, License>(
            "INSERT INTO licenses (key, status, expires_at) VALUES ($1, 'active', $2) RETURNING *",
        )
        .bind(key)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("License '{key}' already exists"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create license", e),
        })?;

        sqlx::query("INSERT INTO license_balances (license_key, balance_hours) VALUES ($1, 0)")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to create balance row", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit license creation", e)
        })?;

        Ok(license)
    }

    async fn set_status(&self, key: &str, status: LicenseStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE licenses SET status = $2 WHERE key = $1")
            .bind(key)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update license status", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("License '{key}' not found")));
        }
        Ok(())
    }

    async fn set_expiration(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query("UPDATE licenses SET expires_at = $2 WHERE key = $1")
            .bind(key)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update expiration", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("License '{key}' not found")));
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<License>> {
        sqlx::query_as::<_, License>("SELECT * FROM licenses ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list licenses", e))
    }
}
