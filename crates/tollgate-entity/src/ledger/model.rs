//! Ledger entry entity model and append outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::EntryReason;

/// A single balance-changing entry in the hour ledger.
///
/// Entries are immutable once written; the balance for a key is always the
/// sum of its entries. Negative `delta_hours` is a usage debit, positive is
/// a credit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    /// Globally monotonic entry ID.
    pub id: i64,
    /// The license this entry belongs to.
    pub license_key: String,
    /// Signed hour delta.
    pub delta_hours: f64,
    /// Why the entry was written.
    pub reason: EntryReason,
    /// Payment provider transaction ID, set on credits only.
    pub idempotency_key: Option<String>,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// Result of a clamped usage debit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebitOutcome {
    /// ID of the written entry, or `None` when nothing was debited and no
    /// entry was recorded.
    pub entry_id: Option<i64>,
    /// Hours actually debited after clamping to the remaining balance.
    pub applied_hours: f64,
    /// Balance after the debit.
    pub balance_hours: f64,
    /// Whether the post-debit balance is zero. A zero-length debit against
    /// remaining hours is not an exhaustion.
    pub exhausted: bool,
}

/// Result of an idempotent payment credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditOutcome {
    /// ID of the credit entry (the prior entry on a duplicate delivery).
    pub entry_id: i64,
    /// Whether this idempotency key had already been applied.
    pub duplicate: bool,
    /// Balance after the credit (unchanged on a duplicate).
    pub balance_hours: f64,
}
