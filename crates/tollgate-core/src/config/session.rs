//! Usage session configuration.

use serde::{Deserialize, Serialize};

/// Usage session tracking configuration.
///
/// Heartbeats drive the usage accounting: each heartbeat debits the elapsed
/// wall-clock time since the previous one. The stale timeout and the missed
/// interval cap bound how much a crashed or clock-drifting client can be
/// over- or under-billed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Expected interval between client heartbeats, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Maximum number of heartbeat intervals a single debit may cover.
    ///
    /// A heartbeat arriving later than `heartbeat_interval_seconds *
    /// max_missed_intervals` is clamped to that cap.
    #[serde(default = "default_max_missed_intervals")]
    pub max_missed_intervals: u32,
    /// Seconds without a heartbeat before a session is treated as crashed.
    #[serde(default = "default_stale_timeout")]
    pub stale_timeout_seconds: u64,
    /// Interval in seconds between stale-session reaper runs.
    #[serde(default = "default_reap_interval")]
    pub reap_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            max_missed_intervals: default_max_missed_intervals(),
            stale_timeout_seconds: default_stale_timeout(),
            reap_interval_seconds: default_reap_interval(),
        }
    }
}

impl SessionConfig {
    /// Maximum elapsed seconds a single heartbeat debit may account for.
    pub fn max_debit_seconds(&self) -> u64 {
        self.heartbeat_interval_seconds * self.max_missed_intervals as u64
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_max_missed_intervals() -> u32 {
    3
}

fn default_stale_timeout() -> u64 {
    90
}

fn default_reap_interval() -> u64 {
    60
}
