//! Access decisions for license-gated operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use tollgate_core::config::gate::GateConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_database::repositories::{Ledger, LicenseStore};
use tollgate_entity::gate::{AccessDecision, AccessIntent, DenyReason};
use tollgate_entity::license::License;

/// Pass/fail authority for gated operations.
///
/// Checks run in a fixed order so a caller always learns the most
/// fundamental problem first: existence, then expiration, then status,
/// then (for `UseService` only) balance. Decisions computed from a
/// successful store read are cached; when the store is unreachable the
/// gate serves the cached decision for the configured grace window and
/// denies with `AuthorityUnavailable` after that. It never fails open.
pub struct AccessGate {
    licenses: Arc<dyn LicenseStore>,
    ledger: Arc<dyn Ledger>,
    /// Last known decision per (key, intent), expiring after the grace window.
    grace_cache: Cache<(String, AccessIntent), AccessDecision>,
}

impl AccessGate {
    /// Creates a new access gate.
    pub fn new(
        licenses: Arc<dyn LicenseStore>,
        ledger: Arc<dyn Ledger>,
        config: &GateConfig,
    ) -> Self {
        Self {
            licenses,
            ledger,
            grace_cache: Cache::builder()
                .max_capacity(config.grace_cache_capacity)
                .time_to_live(std::time::Duration::from_secs(config.authority_grace_seconds))
                .build(),
        }
    }

    /// Decide whether `key` may perform `intent` at `now`.
    ///
    /// Domain denials come back as `Ok(Denied(..))`; an `Err` means an
    /// unexpected failure that is not covered by the grace fallback.
    pub async fn check(
        &self,
        key: &str,
        intent: AccessIntent,
        now: DateTime<Utc>,
    ) -> AppResult<AccessDecision> {
        let license = match self.licenses.find_by_key(key).await {
            Ok(license) => license,
            Err(err) if err.kind == ErrorKind::Database => {
                return Ok(self.grace_fallback(key, intent, &err).await);
            }
            Err(err) => return Err(err),
        };

        let decision = match self.evaluate(license.as_ref(), intent, now).await {
            Ok(decision) => decision,
            Err(err) if err.kind == ErrorKind::Database => {
                return Ok(self.grace_fallback(key, intent, &err).await);
            }
            Err(err) => return Err(err),
        };

        self.grace_cache
            .insert((key.to_string(), intent), decision)
            .await;

        if let Some(reason) = decision.deny_reason() {
            tracing::debug!(license_key = key, intent = ?intent, reason = %reason, "Access denied");
        }

        Ok(decision)
    }

    async fn evaluate(
        &self,
        license: Option<&License>,
        intent: AccessIntent,
        now: DateTime<Utc>,
    ) -> AppResult<AccessDecision> {
        let Some(license) = license else {
            return Ok(AccessDecision::Denied(DenyReason::LicenseNotFound));
        };

        if license.is_expired_at(now) {
            return Ok(AccessDecision::Denied(DenyReason::Expired));
        }

        if !license.is_active() {
            return Ok(AccessDecision::Denied(DenyReason::Inactive));
        }

        // Balance only gates usage. An exhausted license can still buy hours.
        if intent == AccessIntent::UseService {
            let balance = self.ledger.balance(&license.key).await?;
            if balance <= 0.0 {
                return Ok(AccessDecision::Denied(DenyReason::InsufficientBalance));
            }
        }

        Ok(AccessDecision::Granted)
    }

    async fn grace_fallback(
        &self,
        key: &str,
        intent: AccessIntent,
        err: &AppError,
    ) -> AccessDecision {
        match self.grace_cache.get(&(key.to_string(), intent)).await {
            Some(decision) => {
                tracing::warn!(
                    license_key = key,
                    error = %err,
                    "License store unreachable; serving cached decision"
                );
                decision
            }
            None => {
                tracing::error!(
                    license_key = key,
                    error = %err,
                    "License store unreachable and no cached decision; denying"
                );
                AccessDecision::Denied(DenyReason::AuthorityUnavailable)
            }
        }
    }
}

/// Map a denial reason to the error a gated operation should surface.
pub fn deny_error(reason: DenyReason) -> AppError {
    let kind = match reason {
        DenyReason::LicenseNotFound => ErrorKind::NotFound,
        DenyReason::Expired => ErrorKind::Expired,
        DenyReason::Inactive => ErrorKind::Inactive,
        DenyReason::InsufficientBalance => ErrorKind::InsufficientBalance,
        DenyReason::AuthorityUnavailable => ErrorKind::Unavailable,
    };
    AppError::new(kind, format!("Access denied: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStores;
    use chrono::Duration;
    use tollgate_entity::license::LicenseStatus;

    fn far_future() -> DateTime<Utc> {
        Utc::now() + Duration::days(365)
    }

    fn gate(stores: &MemoryStores) -> AccessGate {
        AccessGate::new(
            stores.licenses.clone(),
            stores.ledger.clone(),
            &GateConfig::default(),
        )
    }

    #[tokio::test]
    async fn unknown_key_is_denied_not_found() {
        let stores = MemoryStores::new();
        let gate = gate(&stores);

        let decision = gate
            .check("lic_missing", AccessIntent::UseService, Utc::now())
            .await
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Denied(DenyReason::LicenseNotFound)
        );
    }

    #[tokio::test]
    async fn expiration_outranks_status_and_balance() {
        let stores = MemoryStores::new();
        let now = Utc::now();
        stores
            .seed_license("lic_old", LicenseStatus::Inactive, now - Duration::hours(1), 0.0)
            .await;
        let gate = gate(&stores);

        let decision = gate
            .check("lic_old", AccessIntent::UseService, now)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Denied(DenyReason::Expired));
    }

    #[tokio::test]
    async fn inactive_outranks_balance() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_off", LicenseStatus::Inactive, far_future(), 10.0)
            .await;
        let gate = gate(&stores);

        let decision = gate
            .check("lic_off", AccessIntent::UseService, Utc::now())
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Denied(DenyReason::Inactive));
    }

    #[tokio::test]
    async fn purchase_intent_skips_balance_check() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_empty", LicenseStatus::Active, far_future(), 0.0)
            .await;
        let gate = gate(&stores);
        let now = Utc::now();

        let usage = gate
            .check("lic_empty", AccessIntent::UseService, now)
            .await
            .unwrap();
        assert_eq!(
            usage,
            AccessDecision::Denied(DenyReason::InsufficientBalance)
        );

        let purchase = gate
            .check("lic_empty", AccessIntent::PurchaseHours, now)
            .await
            .unwrap();
        assert_eq!(purchase, AccessDecision::Granted);
    }

    #[tokio::test]
    async fn outage_serves_cached_decision_then_fails_closed() {
        let stores = MemoryStores::new();
        stores
            .seed_license("lic_ok", LicenseStatus::Active, far_future(), 5.0)
            .await;
        let gate = gate(&stores);
        let now = Utc::now();

        // Warm the cache with a successful read.
        let first = gate
            .check("lic_ok", AccessIntent::UseService, now)
            .await
            .unwrap();
        assert_eq!(first, AccessDecision::Granted);

        stores.licenses.set_unavailable(true);

        let cached = gate
            .check("lic_ok", AccessIntent::UseService, now)
            .await
            .unwrap();
        assert_eq!(cached, AccessDecision::Granted);

        // A key never seen during the outage gets no benefit of the doubt.
        let cold = gate
            .check("lic_other", AccessIntent::UseService, now)
            .await
            .unwrap();
        assert_eq!(
            cold,
            AccessDecision::Denied(DenyReason::AuthorityUnavailable)
        );
    }
}
