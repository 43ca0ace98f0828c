//! Access gate.

pub mod service;

pub use service::AccessGate;
