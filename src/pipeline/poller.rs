//! Inbox polling loop.
//!
//! Every tick the responder drains each configured identity's inbox in
//! turn, handing every message to the [`Dispatcher`]. The first fatal error
//! ends the loop and is returned to whoever awaits the task handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::dispatcher::Dispatcher;
use super::types::{DrainReport, Identity};
use crate::error::Result;
use crate::shutdown::Shutdown;
use crate::transport::DumpService;

/// Receive and handle messages for `identity` until its inbox is empty.
pub async fn drain_inbox(
    identity: &Identity,
    dump: &dyn DumpService,
    dispatcher: &Dispatcher,
) -> Result<DrainReport> {
    let mut report = DrainReport::new(&identity.name);

    while let Some(message) = dump.receive(&identity.proof).await? {
        debug!(
            identity = %identity.name,
            id = %message.id,
            sender = %message.sender,
            "Received message"
        );
        let outcome = dispatcher.handle(identity, &message).await?;
        report.record(&outcome);
    }

    Ok(report)
}

/// Drains every identity's inbox, one identity at a time.
pub struct Responder {
    identities: Vec<Identity>,
    dump: Arc<dyn DumpService>,
    dispatcher: Dispatcher,
}

impl Responder {
    pub fn new(
        identities: Vec<Identity>,
        dump: Arc<dyn DumpService>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            identities,
            dump,
            dispatcher,
        }
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// One polling cycle over all identities in configuration order.
    pub async fn run_cycle(&self) -> Result<Vec<DrainReport>> {
        let mut reports = Vec::with_capacity(self.identities.len());
        for identity in &self.identities {
            let report = drain_inbox(identity, self.dump.as_ref(), &self.dispatcher).await?;
            if report.received > 0 {
                info!(
                    identity = %report.identity,
                    received = report.received,
                    replied = report.replied,
                    skipped = report.skipped,
                    "Inbox drained"
                );
            }
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Spawn the polling loop.
///
/// The first tick is skipped so the first cycle runs one `interval` after
/// startup. The task returns `Ok(())` on shutdown and the error on the first
/// fatal failure.
pub fn spawn_responder(
    responder: Arc<Responder>,
    interval: Duration,
    mut shutdown: Shutdown,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        info!(
            "Responder started, polling {} identities every {}s",
            responder.identities().len(),
            interval.as_secs()
        );

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tick.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Responder shutting down");
                    return Ok(());
                }
                _ = tick.tick() => {}
            }

            if let Err(e) = responder.run_cycle().await {
                error!(error = %e, "Fatal error, stopping responder");
                return Err(e);
            }
        }
    })
}
