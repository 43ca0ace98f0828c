//! Payment-completed webhook payload and processing outcomes.

use serde::{Deserialize, Serialize};

/// The payment provider's payment-completed event body.
///
/// The shape is owned by the provider and consumed verbatim; field names
/// follow its camelCase convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    /// License to credit.
    pub license_key: String,
    /// Hours purchased, already computed by the pricing collaborator.
    pub hours: f64,
    /// Provider transaction ID, used as the idempotency key.
    pub transaction_id: String,
    /// Charged amount, informational only.
    pub amount: f64,
    /// Charge currency, informational only.
    pub currency: String,
}

/// Outcome of processing a verified webhook delivery.
///
/// Every variant except signature failure answers HTTP 200 to the provider:
/// retrying an unknown license or a duplicate transaction can never succeed,
/// so signalling an error would only invite a retry storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Credit applied.
    Credited {
        /// Ledger entry written for the credit.
        entry_id: i64,
        /// Balance after the credit.
        balance_hours: f64,
    },
    /// The transaction had already been applied; no new entry was written.
    Duplicate {
        /// The previously written credit entry.
        entry_id: i64,
    },
    /// No license with the given key exists; logged for reconciliation.
    UnknownLicense,
    /// The license is revoked and never receives credit.
    RevokedLicense,
}
