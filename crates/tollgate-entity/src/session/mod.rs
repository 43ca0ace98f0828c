//! Usage session domain entities.

pub mod model;
pub mod state;

pub use model::{CreateSession, Session};
pub use state::{SessionEndReason, SessionState};
