//! # tollgate-worker
//!
//! Background maintenance for Tollgate. The only scheduled task is the
//! stale session reaper, which ends sessions whose clients stopped
//! heartbeating without saying goodbye.

pub mod reaper;
pub mod runner;

pub use reaper::StaleSessionReaper;
pub use runner::WorkerRunner;
