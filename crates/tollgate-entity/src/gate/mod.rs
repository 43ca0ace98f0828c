//! Access gate domain types.

pub mod decision;

pub use decision::{AccessDecision, AccessIntent, DenyReason};
