//! Auto-stop service
//!
//! Periodic admission check, independent of operator navigation. The
//! active day is resolved from the wall clock against the configured
//! event dates; outside the event the pass is a no-op.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;

/// Periodic admission-control check
pub struct AutoStopService {
    scheduler: Arc<Scheduler>,
    period: Duration,
    shutdown: CancellationToken,
}

impl AutoStopService {
    pub fn new(scheduler: Arc<Scheduler>, period: Duration, shutdown: CancellationToken) -> Self {
        Self {
            scheduler,
            period,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(period_secs = self.period.as_secs(), "Auto-stop service started");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => self.check().await,
            }
        }

        tracing::info!("Auto-stop service stopped");
    }

    async fn check(&self) {
        let today = Utc::now().date_naive();
        let Some(day) = self.scheduler.config().day_for_date(today) else {
            return;
        };
        match self.scheduler.check_auto_stop(day).await {
            Ok(report) if report.should_stop => {
                tracing::warn!(
                    day = %day,
                    headcount = report.waiting_headcount,
                    "Auto-stop triggered"
                );
            }
            Ok(report) => {
                tracing::debug!(day = %day, headcount = report.waiting_headcount, "Auto-stop check");
            }
            Err(err) => {
                tracing::error!(day = %day, error = %err, "Auto-stop check failed");
            }
        }
    }
}
