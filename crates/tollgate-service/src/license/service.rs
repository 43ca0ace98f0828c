//! License provisioning and admin operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_database::repositories::{Ledger, LicenseStore};
use tollgate_entity::ledger::LedgerEntry;
use tollgate_entity::license::{License, LicenseStatus};

/// Length of the random part of a generated license key.
const KEY_RANDOM_LEN: usize = 24;

/// Attempts before giving up on a colliding generated key.
const KEY_CREATE_ATTEMPTS: usize = 3;

/// Admin-facing license management.
pub struct LicenseService {
    licenses: Arc<dyn LicenseStore>,
    ledger: Arc<dyn Ledger>,
}

impl LicenseService {
    /// Creates a new license service.
    pub fn new(licenses: Arc<dyn LicenseStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self { licenses, ledger }
    }

    /// Provision a license with a freshly generated key and zero balance.
    pub async fn create(&self, expires_at: DateTime<Utc>) -> AppResult<License> {
        let mut last_err = None;
        for _ in 0..KEY_CREATE_ATTEMPTS {
            let key = generate_key();
            match self.licenses.create(&key, expires_at).await {
                Ok(license) => {
                    tracing::info!(license_key = license.key, "License provisioned");
                    return Ok(license);
                }
                Err(err) if err.kind == tollgate_core::error::ErrorKind::Conflict => {
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err
            .unwrap_or_else(|| AppError::internal("License key generation failed")))
    }

    /// All licenses, newest first.
    pub async fn list(&self) -> AppResult<Vec<License>> {
        self.licenses.list().await
    }

    /// Fetch a license by key.
    pub async fn get(&self, key: &str) -> AppResult<License> {
        self.licenses
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("License '{key}' not found")))
    }

    /// Change the activity status.
    pub async fn set_status(&self, key: &str, status: LicenseStatus) -> AppResult<License> {
        self.licenses.set_status(key, status).await?;
        tracing::info!(license_key = key, status = %status, "License status changed");
        self.get(key).await
    }

    /// Move the expiration date, in either direction.
    pub async fn set_expiration(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<License> {
        self.licenses.set_expiration(key, expires_at).await?;
        tracing::info!(license_key = key, expires_at = %expires_at, "License expiration changed");
        self.get(key).await
    }

    /// Current hour balance.
    pub async fn balance(&self, key: &str) -> AppResult<f64> {
        self.get(key).await?;
        self.ledger.balance(key).await
    }

    /// Full ledger history, oldest first.
    pub async fn ledger_entries(&self, key: &str) -> AppResult<Vec<LedgerEntry>> {
        self.get(key).await?;
        self.ledger.entries(key).await
    }

    /// Apply a manual balance correction.
    pub async fn adjust(&self, key: &str, delta_hours: f64) -> AppResult<LedgerEntry> {
        self.get(key).await?;
        let entry = self.ledger.adjust(key, delta_hours).await?;
        tracing::info!(
            license_key = key,
            delta_hours,
            entry_id = entry.id,
            "Manual balance adjustment"
        );
        Ok(entry)
    }
}

/// Generate an opaque license key.
fn generate_key() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("lic_{random}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStores;
    use chrono::Duration;
    use tollgate_core::error::ErrorKind;

    fn service(stores: &MemoryStores) -> LicenseService {
        LicenseService::new(stores.licenses.clone(), stores.ledger.clone())
    }

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_key();
        let b = generate_key();
        assert!(a.starts_with("lic_"));
        assert_eq!(a.len(), 4 + KEY_RANDOM_LEN);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn create_provisions_zero_balance() {
        let stores = MemoryStores::new();
        let service = service(&stores);

        let license = service.create(Utc::now() + Duration::days(30)).await.unwrap();
        assert_eq!(license.status, LicenseStatus::Active);
        assert_eq!(service.balance(&license.key).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn adjust_rejects_negative_result() {
        let stores = MemoryStores::new();
        stores
            .seed_license(
                "lic_adj",
                LicenseStatus::Active,
                Utc::now() + Duration::days(30),
                2.0,
            )
            .await;
        let service = service(&stores);

        let err = service.adjust("lic_adj", -5.0).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let entry = service.adjust("lic_adj", -1.5).await.unwrap();
        assert_eq!(entry.delta_hours, -1.5);
        assert_eq!(service.balance("lic_adj").await.unwrap(), 0.5);
    }

    #[tokio::test]
    async fn operations_on_missing_license_are_not_found() {
        let stores = MemoryStores::new();
        let service = service(&stores);

        assert_eq!(
            service.get("lic_missing").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            service.balance("lic_missing").await.unwrap_err().kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            service
                .set_status("lic_missing", LicenseStatus::Revoked)
                .await
                .unwrap_err()
                .kind,
            ErrorKind::NotFound
        );
    }
}
