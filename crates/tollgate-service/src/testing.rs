//! In-memory store implementations for tests.
//!
//! These mirror the Postgres semantics closely enough that the service
//! layer behaves identically against either backend: the ledger clamps
//! debits and deduplicates credits, the license store keeps a balance row
//! per key, and the session store enforces the active/ended transitions.
//! The license store can also be flipped into an unreachable state to
//! exercise the gate's grace fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
pub use tollgate_database::repositories::{Ledger, LicenseStore, SessionStore};
use tollgate_entity::ledger::{CreditOutcome, DebitOutcome, EntryReason, LedgerEntry};
use tollgate_entity::license::{License, LicenseStatus};
use tollgate_entity::session::{CreateSession, Session, SessionEndReason, SessionState};

/// In-memory license store.
#[derive(Default)]
pub struct MemoryLicenseStore {
    licenses: Mutex<HashMap<String, License>>,
    unavailable: AtomicBool,
}

impl MemoryLicenseStore {
    /// Simulate the store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("License store unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<License>> {
        self.check_available()?;
        Ok(self.licenses.lock().await.get(key).cloned())
    }

    async fn create(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<License> {
        self.check_available()?;
        let mut licenses = self.licenses.lock().await;
        if licenses.contains_key(key) {
            return Err(AppError::conflict(format!("License '{key}' already exists")));
        }
        let license = License {
            key: key.to_string(),
            status: LicenseStatus::Active,
            expires_at,
            created_at: Utc::now(),
        };
        licenses.insert(key.to_string(), license.clone());
        Ok(license)
    }

    async fn set_status(&self, key: &str, status: LicenseStatus) -> AppResult<()> {
        self.check_available()?;
        let mut licenses = self.licenses.lock().await;
        let license = licenses
            .get_mut(key)
            .ok_or_else(|| AppError::not_found(format!("License '{key}' not found")))?;
        license.status = status;
        Ok(())
    }

    async fn set_expiration(&self, key: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        self.check_available()?;
        let mut licenses = self.licenses.lock().await;
        let license = licenses
            .get_mut(key)
            .ok_or_else(|| AppError::not_found(format!("License '{key}' not found")))?;
        license.expires_at = expires_at;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<License>> {
        self.check_available()?;
        let licenses = self.licenses.lock().await;
        let mut all: Vec<License> = licenses.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[derive(Default)]
struct LedgerInner {
    balances: HashMap<String, f64>,
    entries: Vec<LedgerEntry>,
    transactions: HashMap<String, i64>,
    next_id: i64,
}

impl LedgerInner {
    fn append(
        &mut self,
        key: &str,
        delta_hours: f64,
        reason: EntryReason,
        idempotency_key: Option<String>,
    ) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(LedgerEntry {
            id,
            license_key: key.to_string(),
            delta_hours,
            reason,
            idempotency_key,
            created_at: Utc::now(),
        });
        *self.balances.entry(key.to_string()).or_insert(0.0) += delta_hours;
        id
    }
}

/// In-memory ledger with the same clamping and dedup semantics as Postgres.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    /// Simulate the ledger being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("Ledger unreachable"));
        }
        Ok(())
    }

    // The Postgres ledger creates a zero balance row alongside every license,
    // so a missing row here just reads as zero.
    fn balance_of(inner: &LedgerInner, key: &str) -> AppResult<f64> {
        Ok(inner.balances.get(key).copied().unwrap_or(0.0))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn debit_clamped(&self, key: &str, hours: f64) -> AppResult<DebitOutcome> {
        self.check_available()?;
        if hours < 0.0 {
            return Err(AppError::validation("Debit hours must be non-negative"));
        }

        let mut inner = self.inner.lock().await;
        let balance = Self::balance_of(&inner, key)?;

        let applied = hours.min(balance);
        if applied <= 0.0 {
            return Ok(DebitOutcome {
                entry_id: None,
                applied_hours: 0.0,
                balance_hours: balance.max(0.0),
                exhausted: balance <= 0.0,
            });
        }

        let entry_id = inner.append(key, -applied, EntryReason::Usage, None);
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
        self.check_available()?;
        if hours <= 0.0 {
            return Err(AppError::validation("Credit hours must be positive"));
        }

        let mut inner = self.inner.lock().await;
        let balance = Self::balance_of(&inner, key)?;

        if let Some(&entry_id) = inner.transactions.get(idempotency_key) {
            return Ok(CreditOutcome {
                entry_id,
                duplicate: true,
                balance_hours: balance,
            });
        }

        let entry_id = inner.append(
            key,
            hours,
            EntryReason::PaymentCredit,
            Some(idempotency_key.to_string()),
        );
        inner
            .transactions
            .insert(idempotency_key.to_string(), entry_id);

        Ok(CreditOutcome {
            entry_id,
            duplicate: false,
            balance_hours: balance + hours,
        })
    }

    async fn adjust(&self, key: &str, delta_hours: f64) -> AppResult<LedgerEntry> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;
        let balance = Self::balance_of(&inner, key)?;

        if balance + delta_hours < 0.0 {
            return Err(AppError::validation(format!(
                "Adjustment of {delta_hours}h would drive balance below zero (current {balance}h)"
            )));
        }

        let entry_id = inner.append(key, delta_hours, EntryReason::AdminAdjustment, None);
        let entry = inner
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| AppError::internal("Entry vanished after append"))?;
        Ok(entry)
    }

    async fn balance(&self, key: &str) -> AppResult<f64> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Self::balance_of(&inner, key)
    }

    async fn entries(&self, key: &str) -> AppResult<Vec<LedgerEntry>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.license_key == key)
            .cloned()
            .collect())
    }
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &CreateSession) -> AppResult<Session> {
        let created = Session {
            id: Uuid::new_v4(),
            license_key: session.license_key.clone(),
            state: SessionState::Active,
            end_reason: None,
            started_at: session.started_at,
            last_heartbeat_at: session.started_at,
            ended_at: None,
        };
        self.sessions
            .lock()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }

    async fn record_heartbeat(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Session> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?;
        if session.state != SessionState::Active {
            return Err(AppError::conflict(format!("Session '{id}' is not active")));
        }
        let previous = session.clone();
        session.last_heartbeat_at = at;
        Ok(previous)
    }

    async fn rewind_heartbeat(
        &self,
        id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&id) {
            if session.state == SessionState::Active && session.last_heartbeat_at == from {
                session.last_heartbeat_at = to;
            }
        }
        Ok(())
    }

    async fn end(
        &self,
        id: Uuid,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Session '{id}' not found")))?;
        if session.state == SessionState::Active {
            session.state = SessionState::Ended;
            session.end_reason = Some(reason);
            session.ended_at = Some(at);
        }
        Ok(session.clone())
    }

    async fn find_stale(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Session>> {
        let sessions = self.sessions.lock().await;
        let mut stale: Vec<Session> = sessions
            .values()
            .filter(|s| s.state == SessionState::Active && s.last_heartbeat_at <= cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|s| s.last_heartbeat_at);
        Ok(stale)
    }

    async fn count_active_by_key(&self, key: &str) -> AppResult<i64> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .values()
            .filter(|s| s.license_key == key && s.state == SessionState::Active)
            .count() as i64)
    }

    async fn count_active(&self) -> AppResult<i64> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .values()
            .filter(|s| s.state == SessionState::Active)
            .count() as i64)
    }
}

/// Bundle of in-memory stores wired the way `main` wires the Postgres ones.
pub struct MemoryStores {
    /// License store.
    pub licenses: Arc<MemoryLicenseStore>,
    /// Hour ledger.
    pub ledger: Arc<MemoryLedger>,
    /// Session store.
    pub sessions: Arc<MemorySessionStore>,
}

impl MemoryStores {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self {
            licenses: Arc::new(MemoryLicenseStore::default()),
            ledger: Arc::new(MemoryLedger::default()),
            sessions: Arc::new(MemorySessionStore::default()),
        }
    }

    /// Create a license with its balance row and credit an opening balance.
    pub async fn seed_license(
        &self,
        key: &str,
        status: LicenseStatus,
        expires_at: DateTime<Utc>,
        balance_hours: f64,
    ) {
        self.licenses
            .create(key, expires_at)
            .await
            .expect("seed license");
        if status != LicenseStatus::Active {
            self.licenses
                .set_status(key, status)
                .await
                .expect("seed status");
        }
        if balance_hours > 0.0 {
            self.ledger
                .credit(key, balance_hours, &format!("seed-{key}"))
                .await
                .expect("seed balance");
        }
    }
}

impl Default for MemoryStores {
    fn default() -> Self {
        Self::new()
    }
}
