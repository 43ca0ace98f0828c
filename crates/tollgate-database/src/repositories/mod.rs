//! Store trait seams and their Postgres implementations.
//!
//! Each module defines the async trait the services depend on next to its
//! production implementation. Unit tests in `tollgate-service` substitute
//! in-memory implementations behind the same traits.

pub mod ledger;
pub mod license;
pub mod session;

pub use ledger::{Ledger, PgLedger};
pub use license::{LicenseStore, PgLicenseStore};
pub use session::{PgSessionStore, SessionStore};
