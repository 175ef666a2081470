//! Absence Monitor service
//!
//! Periodic pass over both event days purging absentees whose grace
//! period ran out. Registered as a periodic background task; the loop
//! exits when the shutdown token fires.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;
use shared::models::EventDay;

/// Periodic absentee purge
pub struct AbsenceMonitor {
    scheduler: Arc<Scheduler>,
    period: Duration,
    shutdown: CancellationToken,
}

impl AbsenceMonitor {
    pub fn new(scheduler: Arc<Scheduler>, period: Duration, shutdown: CancellationToken) -> Self {
        Self {
            scheduler,
            period,
            shutdown,
        }
    }

    /// Main loop: tick, sweep, repeat until shutdown
    pub async fn run(self) {
        tracing::info!(period_secs = self.period.as_secs(), "Absence monitor started");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => self.sweep().await,
            }
        }

        tracing::info!("Absence monitor stopped");
    }

    async fn sweep(&self) {
        let now = Utc::now();
        for day in EventDay::ALL {
            match self.scheduler.purge_expired(day, now).await {
                Ok(report) if !report.purged.is_empty() => {
                    tracing::info!(day = %day, purged = report.purged.len(), "Absence sweep");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(day = %day, error = %err, "Absence sweep failed");
                }
            }
        }
    }
}
