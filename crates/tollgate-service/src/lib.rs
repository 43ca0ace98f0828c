//! # tollgate-service
//!
//! Business logic service layer for Tollgate. Each service orchestrates
//! the license store, the hour ledger, and the session store to implement
//! application-level use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references to the store traits, so every
//! service runs unchanged against Postgres or the in-memory stores in
//! [`testing`].

pub mod gate;
pub mod license;
pub mod payment;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use gate::AccessGate;
pub use license::LicenseService;
pub use payment::{PaymentProcessor, verify_signature};
pub use session::{HeartbeatOutcome, SessionTracker};
