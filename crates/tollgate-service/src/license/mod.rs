//! License provisioning and administration.

pub mod service;

pub use service::LicenseService;
