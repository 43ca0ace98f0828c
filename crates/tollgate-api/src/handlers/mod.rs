//! HTTP request handlers, organized by domain.

pub mod access;
pub mod health;
pub mod license;
pub mod payment;
pub mod session;
