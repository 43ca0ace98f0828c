//! Ledger entry reason enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    /// Usage debit from an active session heartbeat.
    Usage,
    /// Credit from a completed payment.
    PaymentCredit,
    /// Manual adjustment by an operator.
    AdminAdjustment,
}

impl EntryReason {
    /// Return the reason as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::PaymentCredit => "payment_credit",
            Self::AdminAdjustment => "admin_adjustment",
        }
    }
}

impl fmt::Display for EntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
