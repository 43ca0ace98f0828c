//! Session tracking and metering.

pub mod tracker;

pub use tracker::{HeartbeatOutcome, SessionTracker};
