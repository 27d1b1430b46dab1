//! Periodic sweep loop.
//!
//! Waits `interval`, sweeps every joined room except the log room, repeats.
//! A failed room listing is retried after the [`RetryPolicy`] delay instead.
//!
//! Shutdown: cancelling the token interrupts the wait immediately. A sweep in
//! progress finishes the room it is on and stops before the next one.

use std::sync::Arc;

use fedwatch_common::config::AppConfig;
use fedwatch_matrix::Homeserver;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{error::SweepError, retry::RetryPolicy, sweep::RoomSweeper};

/// Counters for one completed sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub rooms_swept: usize,
    pub rooms_with_failures: usize,
    pub rooms_skipped: usize,
    pub reports_undelivered: usize,
}

pub struct Scheduler {
    config: Arc<AppConfig>,
    homeserver: Arc<dyn Homeserver>,
    sweeper: RoomSweeper,
    retry: RetryPolicy,
}

impl Scheduler {
    pub fn new(config: Arc<AppConfig>, homeserver: Arc<dyn Homeserver>, sweeper: RoomSweeper) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self { config, homeserver, sweeper, retry }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let interval = self.config.monitor.interval();
        let mut delay = interval;
        let mut failed_cycles: u32 = 0;

        info!("Scheduler started, sweeping every {}s", interval.as_secs());
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, scheduler stopping");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match self.sweep_all(&shutdown).await {
                Ok(summary) => {
                    failed_cycles = 0;
                    delay = interval;
                    info!(
                        "Sweep cycle done: {} room(s) swept, {} with failures, {} skipped, {} undelivered",
                        summary.rooms_swept,
                        summary.rooms_with_failures,
                        summary.rooms_skipped,
                        summary.reports_undelivered
                    );
                }
                Err(e) => {
                    failed_cycles = failed_cycles.saturating_add(1);
                    delay = self.retry.delay(failed_cycles);
                    error!(
                        "Sweep cycle aborted (attempt {}): {}. Retrying in {}s",
                        failed_cycles,
                        e,
                        delay.as_secs()
                    );
                }
            }
        }
    }

    /// One pass over every joined room.
    pub async fn sweep_all(&self, shutdown: &CancellationToken) -> Result<CycleSummary, SweepError> {
        let rooms = self.homeserver.joined_rooms().await.map_err(SweepError::RoomList)?;
        let log_room = self.config.matrix.log_room.as_str();
        let mut summary = CycleSummary::default();

        for room_id in rooms.iter().filter(|r| r.as_str() != log_room) {
            if shutdown.is_cancelled() {
                info!("Shutdown requested, stopping sweep before {}", room_id);
                break;
            }
            match self.sweeper.sweep_room(room_id).await {
                Ok(Some(report)) => {
                    summary.rooms_swept += 1;
                    if report.has_failures() {
                        summary.rooms_with_failures += 1;
                    }
                    if !report.delivered {
                        summary.reports_undelivered += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    summary.rooms_skipped += 1;
                    warn!("Skipping room {}: {}", room_id, e);
                }
            }
        }
        Ok(summary)
    }
}
