//! Sweeping a single room.
//!
//! Metadata → members → distinct domains → resolve + probe each domain →
//! exactly one message to the log room.

use std::sync::Arc;

use fedwatch_common::config::AppConfig;
use fedwatch_federation::{CheckResult, ReachabilityProbe, ServerResolver};
use fedwatch_matrix::Homeserver;
use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    error::SweepError,
    report::{DomainStatus, RoomSnapshot, SweepReport},
};

/// Checks every federated server taking part in a room.
pub struct RoomSweeper {
    config: Arc<AppConfig>,
    homeserver: Arc<dyn Homeserver>,
    resolver: Arc<dyn ServerResolver>,
    prober: Arc<dyn ReachabilityProbe>,
}

impl RoomSweeper {
    pub fn new(
        config: Arc<AppConfig>,
        homeserver: Arc<dyn Homeserver>,
        resolver: Arc<dyn ServerResolver>,
        prober: Arc<dyn ReachabilityProbe>,
    ) -> Self {
        Self { config, homeserver, resolver, prober }
    }

    fn log_room(&self) -> &str {
        &self.config.matrix.log_room
    }

    /// Collect display data and member domains for `room_id`.
    ///
    /// Metadata failures are absorbed; a member-list failure is returned.
    pub async fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot, SweepError> {
        let metadata = match self.homeserver.room_metadata(room_id).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Metadata lookup for {} failed, using fallbacks: {}", room_id, e);
                None
            }
        };

        let members = self
            .homeserver
            .joined_members(room_id)
            .await
            .map_err(|source| SweepError::Members { room_id: room_id.to_owned(), source })?;

        Ok(RoomSnapshot::new(room_id, metadata, members))
    }

    /// Resolve then probe one domain.
    pub async fn check_domain(&self, domain: &str) -> CheckResult {
        match self.resolver.resolve(domain).await {
            Ok(target) => {
                if self.prober.probe(&target).await {
                    CheckResult::Ok
                } else {
                    CheckResult::FailedUnreachable
                }
            }
            Err(e) => CheckResult::FailedDelegation(e.to_string()),
        }
    }

    /// Sweep `room_id` and post its report to the log room.
    ///
    /// Returns `Ok(None)` for the log room itself, which is never swept.
    pub async fn sweep_room(&self, room_id: &str) -> Result<Option<SweepReport>, SweepError> {
        if room_id == self.log_room() {
            debug!("Skipping log room {}", room_id);
            return Ok(None);
        }

        let snapshot = self.snapshot(room_id).await?;
        debug!(
            "Sweeping {} with {} distinct server(s)",
            snapshot.description(),
            snapshot.domains.len()
        );

        let statuses: Vec<DomainStatus> = stream::iter(snapshot.domains.iter().cloned())
            .map(|domain| async move {
                let result = self.check_domain(&domain).await;
                DomainStatus { domain, result }
            })
            .buffer_unordered(self.config.monitor.concurrency.max(1))
            .collect()
            .await;

        let mut report = SweepReport::new(&snapshot, statuses);
        for line in report.status_lines() {
            info!("[{}] {}", room_id, line);
        }

        match self.homeserver.send_text(self.log_room(), &report.message()).await {
            Ok(()) => report.delivered = true,
            Err(e) => warn!("Failed to deliver report for {} to {}: {}", room_id, self.log_room(), e),
        }

        let failed = report.failures().count();
        info!(
            "Swept {}: {} server(s), {} failing",
            report.description,
            report.statuses.len(),
            failed
        );
        Ok(Some(report))
    }
}
