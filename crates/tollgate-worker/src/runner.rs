//! Worker runner: periodic loop that sweeps for stale sessions.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::reaper::StaleSessionReaper;

/// Runs the reaper on a fixed interval until the cancel signal is received.
pub struct WorkerRunner {
    reaper: StaleSessionReaper,
    interval: Duration,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(reaper: StaleSessionReaper, interval_seconds: u64) -> Self {
        Self {
            reaper,
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// Start the runner. Runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Session reaper started with interval={}s",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Session reaper received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(self.interval) => {
                    if let Err(e) = self.reaper.run_once().await {
                        tracing::error!("Stale session sweep failed: {}", e);
                    }
                }
            }
        }

        tracing::info!("Session reaper shut down complete");
    }
}
