//! Ledger domain entities.

pub mod model;
pub mod reason;

pub use model::{CreditOutcome, DebitOutcome, LedgerEntry};
pub use reason::EntryReason;
