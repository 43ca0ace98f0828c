//! Session state and end-reason enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a usage session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session is accumulating usage.
    Active,
    /// Session is finished; no further debits may be attributed to it.
    Ended,
}

impl SessionState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a session transitioned to `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_end_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    /// The client ended the session explicitly.
    ClientEnded,
    /// A debit drained the hour balance to zero.
    BalanceExhausted,
    /// The reaper resolved a session whose heartbeats stopped.
    StaleTimeout,
}

impl SessionEndReason {
    /// Return the reason as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientEnded => "client_ended",
            Self::BalanceExhausted => "balance_exhausted",
            Self::StaleTimeout => "stale_timeout",
        }
    }
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
