//! Access gate configuration.

use serde::{Deserialize, Serialize};

/// Access gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// How long a last-known-good gate decision may be reused when the
    /// license store is unreachable, in seconds. Beyond this window the
    /// gate fails closed with `AUTHORITY_UNAVAILABLE`.
    #[serde(default = "default_grace")]
    pub authority_grace_seconds: u64,
    /// Maximum number of cached last-known-good decisions.
    #[serde(default = "default_cache_capacity")]
    pub grace_cache_capacity: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            authority_grace_seconds: default_grace(),
            grace_cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_grace() -> u64 {
    60
}

fn default_cache_capacity() -> u64 {
    10_000
}
