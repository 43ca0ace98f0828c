//! Stale session reaping task.

use std::sync::Arc;

use chrono::Utc;

use tollgate_core::result::AppResult;
use tollgate_service::SessionTracker;

/// Ends sessions whose heartbeats stopped without a client end.
///
/// Reaped sessions are charged nothing beyond what their last heartbeat
/// already debited; the per-heartbeat clamp bounds the write-off.
pub struct StaleSessionReaper {
    tracker: Arc<SessionTracker>,
}

impl StaleSessionReaper {
    /// Creates a new reaper.
    pub fn new(tracker: Arc<SessionTracker>) -> Self {
        Self { tracker }
    }

    /// Run one reaping sweep. Returns the number of sessions ended.
    pub async fn run_once(&self) -> AppResult<usize> {
        let reaped = self.tracker.reap_stale(Utc::now()).await?;
        if reaped > 0 {
            tracing::info!(reaped, "Stale session sweep complete");
        }
        Ok(reaped)
    }
}
