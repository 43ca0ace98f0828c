//! Application state shared across all handlers.

use std::sync::Arc;

use tollgate_core::config::AppConfig;
use tollgate_database::repositories::{Ledger, LicenseStore, SessionStore};
use tollgate_service::{AccessGate, LicenseService, PaymentProcessor, SessionTracker};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks. The stores
/// are held as trait objects, so the same state wires up against Postgres
/// in production and the in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,

    /// License store.
    pub licenses: Arc<dyn LicenseStore>,
    /// Hour ledger.
    pub ledger: Arc<dyn Ledger>,
    /// Session store.
    pub sessions: Arc<dyn SessionStore>,

    /// Access gate.
    pub gate: Arc<AccessGate>,
    /// Session tracker.
    pub tracker: Arc<SessionTracker>,
    /// Payment webhook processor.
    pub payments: Arc<PaymentProcessor>,
    /// License administration.
    pub license_service: Arc<LicenseService>,
}
