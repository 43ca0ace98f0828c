//! Payment webhook processing.

use std::sync::Arc;

use tollgate_core::config::payment::PaymentConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_database::repositories::{Ledger, LicenseStore};
use tollgate_entity::payment::{PaymentEvent, WebhookOutcome};

use super::signature::verify_signature;

/// Turns verified payment events into ledger credits, exactly once each.
///
/// The money already moved by the time the webhook arrives, so an expired
/// or inactive license is still credited; the hours simply stay unusable
/// until the license is fixed. Only a revoked license refuses the credit.
pub struct PaymentProcessor {
    licenses: Arc<dyn LicenseStore>,
    ledger: Arc<dyn Ledger>,
    config: PaymentConfig,
}

impl PaymentProcessor {
    /// Creates a new payment processor.
    pub fn new(
        licenses: Arc<dyn LicenseStore>,
        ledger: Arc<dyn Ledger>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            licenses,
            ledger,
            config,
        }
    }

    /// Verify, parse, and apply one webhook delivery.
    ///
    /// The signature covers the raw body bytes, so verification happens
    /// before any parsing. Redelivery of a processed transaction ID is
    /// acknowledged without a second credit.
    pub async fn process(&self, body: &[u8], signature: &str) -> AppResult<WebhookOutcome> {
        verify_signature(&self.config.webhook_secret, body, signature)?;

        let event: PaymentEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::validation(format!("Malformed payment event: {e}")))?;

        if event.hours <= 0.0 {
            return Err(AppError::validation(format!(
                "Payment event hours must be positive, got {}",
                event.hours
            )));
        }
        if event.transaction_id.is_empty() {
            return Err(AppError::validation("Payment event has no transaction ID"));
        }

        let license = match self.licenses.find_by_key(&event.license_key).await? {
            Some(license) => license,
            None => {
                tracing::warn!(
                    license_key = event.license_key,
                    transaction_id = event.transaction_id,
                    "Payment for unknown license"
                );
                return Ok(WebhookOutcome::UnknownLicense);
            }
        };

        if license.is_revoked() {
            tracing::warn!(
                license_key = event.license_key,
                transaction_id = event.transaction_id,
                "Payment for revoked license refused"
            );
            return Ok(WebhookOutcome::RevokedLicense);
        }

        let outcome = self
            .ledger
            .credit(&event.license_key, event.hours, &event.transaction_id)
            .await?;

        if outcome.duplicate {
            tracing::info!(
                transaction_id = event.transaction_id,
                entry_id = outcome.entry_id,
                "Duplicate payment delivery acknowledged"
            );
            Ok(WebhookOutcome::Duplicate {
                entry_id: outcome.entry_id,
            })
        } else {
            tracing::info!(
                license_key = event.license_key,
                transaction_id = event.transaction_id,
                hours = event.hours,
                balance_hours = outcome.balance_hours,
                "Payment credited"
            );
            Ok(WebhookOutcome::Credited {
                entry_id: outcome.entry_id,
                balance_hours: outcome.balance_hours,
            })
        }
    }
}
