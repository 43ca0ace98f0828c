//! # tollgate-database
//!
//! PostgreSQL connection management, migrations, and the store trait seams
//! with their Postgres implementations.

pub mod connection;
pub mod migration;
pub mod repositories;
