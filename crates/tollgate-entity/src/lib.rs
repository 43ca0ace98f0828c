//! # tollgate-entity
//!
//! Domain entity models for Tollgate. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod gate;
pub mod ledger;
pub mod license;
pub mod payment;
pub mod session;
