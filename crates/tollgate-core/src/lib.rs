//! Core building blocks for Tollgate.
//!
//! This crate holds the unified error type, the configuration schemas, and
//! the result alias shared by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
