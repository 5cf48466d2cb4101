//! Radar Refresh Task
//!
//! Background task that periodically re-fetches the radar frame list.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::timeline::{RefreshOutcome, TimelineController};

/// Spawns a background task that refreshes the radar timeline.
///
/// The first refresh happens one interval after spawning; the caller loads
/// the initial frame list itself. Failures are logged and the previous frames
/// stay on display until the next run.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_radar_refresh_task(
    timeline: Arc<TimelineController>,
    refresh_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(refresh_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting radar refresh task with interval of {} seconds",
            refresh_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match timeline.refresh().await {
                Ok(RefreshOutcome::Replaced { frames, .. }) => {
                    debug!("Radar refresh: {} frames", frames)
                }
                Ok(RefreshOutcome::Empty) => debug!("Radar refresh: empty list ignored"),
                Ok(RefreshOutcome::Superseded) => debug!("Radar refresh: superseded"),
                Err(e) => warn!("Radar refresh failed: {}", e),
            }
        }
    })
}
