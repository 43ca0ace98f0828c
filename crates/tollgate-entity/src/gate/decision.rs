//! Access gate intents, decisions, and denial reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller wants to do once granted.
///
/// The intent determines which checks apply: `PurchaseHours` skips the
/// balance check so an exhausted license can still buy more time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessIntent {
    /// Use a metered feature of the platform.
    UseService,
    /// Purchase additional hours.
    PurchaseHours,
}

/// Why the gate denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No license with the given key exists.
    LicenseNotFound,
    /// The license has passed its expiration date.
    Expired,
    /// The license status is not Active.
    Inactive,
    /// The hour balance is exhausted (UseService only).
    InsufficientBalance,
    /// The license store is unreachable and the grace window has lapsed.
    AuthorityUnavailable,
}

impl DenyReason {
    /// Return the reason as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LicenseNotFound => "license_not_found",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
            Self::InsufficientBalance => "insufficient_balance",
            Self::AuthorityUnavailable => "authority_unavailable",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The gate's pass/fail answer for one license and intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    /// The operation may proceed.
    Granted,
    /// The operation is refused.
    Denied(DenyReason),
}

impl AccessDecision {
    /// Check whether access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The denial reason, if denied.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Granted => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}
