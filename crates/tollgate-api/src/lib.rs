//! # tollgate-api
//!
//! HTTP API layer for Tollgate built on Axum.
//!
//! Provides the REST endpoints for access checks, session tracking, the
//! payment webhook, and license administration, plus DTOs and error mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
