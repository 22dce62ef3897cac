//! Background task that keeps the headline cache fresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::HeadlineCache;
use crate::shutdown::Shutdown;

/// Spawn a task that refreshes `cache` every `interval` until shutdown.
///
/// The first tick is skipped: startup performs its own initial refresh.
/// Refresh failures are logged and retried on the next tick.
pub fn spawn_cache_refresher(
    cache: Arc<dyn HeadlineCache>,
    interval: Duration,
    mut shutdown: Shutdown,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Cache refresher started, refreshing every {}s", interval.as_secs());

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tick.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Cache refresher shutting down");
                    return;
                }
                _ = tick.tick() => {}
            }

            if let Err(e) = cache.refresh().await {
                error!(error = %e, "Error refreshing headlines");
            }
        }
    })
}
