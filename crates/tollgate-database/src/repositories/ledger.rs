//! Hour ledger trait and Postgres implementation.
//!
//! The ledger is append-only. A materialized running total per key
//! (`license_balances`) gives O(1) balance reads; it is updated in the same
//! transaction as every entry insert, never separately. All mutating
//! operations serialize per license key by taking a row-level lock on the
//! balance row, so concurrent debit/credit races cannot read a stale balance.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_entity::ledger::{CreditOutcome, DebitOutcome, EntryReason, LedgerEntry};

/// Append-only log of balance-changing entries.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Debit up to `hours`, clamped to the remaining balance.
    ///
    /// The balance never goes below zero; a debit that would cross zero is
    /// recorded at the clamped amount and reported as exhausting. A
    /// zero-hour debit writes no entry, and is exhausting only when the
    /// balance is already empty.
    async fn debit_clamped(&self, key: &str, hours: f64) -> AppResult<DebitOutcome>;

    /// Apply a payment credit exactly once per idempotency key.
    ///
    /// Redelivery with a known idempotency key is a no-op that returns the
    /// prior entry ID. The dedup record, the entry, and the balance update
    /// share one atomic unit.
    async fn credit(&self, key: &str, hours: f64, idempotency_key: &str)
        -> AppResult<CreditOutcome>;

    /// Append a signed admin adjustment.
    ///
    /// Negative adjustments that would drive the balance below zero are
    /// rejected so the non-negative balance invariant holds globally.
    async fn adjust(&self, key: &str, delta_hours: f64) -> AppResult<LedgerEntry>;

    /// Current balance for a key.
    async fn balance(&self, key: &str) -> AppResult<f64>;

    /// All entries for a key, oldest first.
    async fn entries(&self, key: &str) -> AppResult<Vec<LedgerEntry>>;
}

/// Postgres-backed ledger.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Create a new ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the balance row for a key and return the current balance.
    ///
    /// This is the per-key serialization point for every mutating operation.
    async fn lock_balance(tx: &mut Transaction<'_, Postgres>, key: &str) -> AppResult<f64> {
        sqlx::query_scalar::<_, f64>(
            "SELECT balance_hours FROM license_balances WHERE license_key = $1 FOR UPDATE",
        )
        .bind(key)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock balance row", e))?
        .ok_or_else(|| AppError::not_found(format!("License '{key}' has no balance row")))
    }

    async fn append_entry(
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
        delta_hours: f64,
        reason: EntryReason,
        idempotency_key: Option<&str>,
    ) -> AppResult<i64> {
        let entry_id: i64 = sqlx::query_scalar(
            "INSERT INTO ledger_entries (license_key, delta_hours, reason, idempotency_key) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(key)
        .bind(delta_hours)
        .bind(reason)
        .bind(idempotency_key)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append ledger entry", e)
        })?;

        sqlx::query(
            "UPDATE license_balances SET balance_hours = balance_hours + $2, updated_at = NOW() \
             WHERE license_key = $1",
        )
        .bind(key)
        .bind(delta_hours)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update running total", e)
        })?;

        Ok(entry_id)
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }

    async fn commit(tx: Transaction<'_, Postgres>) -> AppResult<()> {
        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn debit_clamped(&self, key: &str, hours: f64) -> AppResult<DebitOutcome> {
        if hours < 0.0 {
            return Err(AppError::validation("Debit hours must be non-negative"));
        }

        let mut tx = self.begin().await?;
        let balance = Self::lock_balance(&mut tx, key).await?;

        let applied = hours.min(balance);
        if applied <= 0.0 {
            // Nothing to record. Only an empty balance counts as exhausted;
            // a zero-length interval against remaining hours does not.
            return Ok(DebitOutcome {
                entry_id: None,
                applied_hours: 0.0,
                balance_hours: balance.max(0.0),
                exhausted: balance <= 0.0,
            });
        }

        let entry_id = Self::append_entry(&mut tx, key, -applied, EntryReason::Usage, None).await?;
        Self::commit(tx).await?;

        let balance_hours = balance - applied;
        Ok(DebitOutcome {
            entry_id: Some(entry_id),
            applied_hours: applied,
            balance_hours,
            exhausted: balance_hours <= 0.0,
        })
    }

    async fn credit(
        &self,
        key: &str,
        hours: f64,
        idempotency_key: &str,
    ) -> AppResult<CreditOutcome> {
        if hours <= 0.0 {
            return Err(AppError::validation("Credit hours must be positive"));
        }

        let mut tx = self.begin().await?;
        let balance = Self::lock_balance(&mut tx, key).await?;

        let prior: Option<i64> = sqlx::query_scalar(
            "SELECT entry_id FROM payment_transactions WHERE idempotency_key = $1",
        )
        .bind(idempotency_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check dedup table", e)
        })?;

        if let Some(entry_id) = prior {
            return Ok(CreditOutcome {
                entry_id,
                duplicate: true,
                balance_hours: balance,
            });
        }

        let entry_id = Self::append_entry(
            &mut tx,
            key,
            hours,
            EntryReason::PaymentCredit,
            Some(idempotency_key),
        )
        .await?;

        sqlx::query(
            "INSERT INTO payment_transactions (idempotency_key, license_key, entry_id) \
             VALUES ($1, $2, $3)",
        )
        .bind(idempotency_key)
        .bind(key)
        .bind(entry_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record transaction", e)
        })?;

        Self::commit(tx).await?;

        Ok(CreditOutcome {
            entry_id,
            duplicate: false,
            balance_hours: balance + hours,
        })
    }

    async fn adjust(&self, key: &str, delta_hours: f64) -> AppResult<LedgerEntry> {
        let mut tx = self.begin().await?;
        let balance = Self::lock_balance(&mut tx, key).await?;

        if balance + delta_hours < 0.0 {
            return Err(AppError::validation(format!(
                "Adjustment of {delta_hours}h would drive balance below zero (current {balance}h)"
            )));
        }

        let entry_id =
            Self::append_entry(&mut tx, key, delta_hours, EntryReason::AdminAdjustment, None)
                .await?;

        let entry = sqlx::query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read back entry", e)
            })?;

        Self::commit(tx).await?;
        Ok(entry)
    }

    async fn balance(&self, key: &str) -> AppResult<f64> {
        sqlx::query_scalar::<_, f64>(
            "SELECT balance_hours FROM license_balances WHERE license_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read balance", e))?
        .ok_or_else(|| AppError::not_found(format!("License '{key}' has no balance row")))
    }

    async fn entries(&self, key: &str) -> AppResult<Vec<LedgerEntry>> {
        sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM ledger_entries WHERE license_key = $1 ORDER BY id ASC",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list entries", e))
    }
}
