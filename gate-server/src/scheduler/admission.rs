//! Admission Controller (auto-stop)
//!
//! Evaluates the waiting headcount against the configured threshold and
//! closes reception when it is crossed. Closing is idempotent and
//! one-way: reopening is always an explicit operator action through the
//! settings endpoint.

use serde::{Deserialize, Serialize};

use shared::models::EventDay;

use super::{Scheduler, SchedulerResult};

/// Outcome of one admission check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoStopReport {
    pub should_stop: bool,
    pub waiting_headcount: u32,
    pub threshold: u32,
    pub auto_stop_enabled: bool,
}

impl Scheduler {
    /// Evaluate the auto-stop rule for a day.
    ///
    /// Sums eligible headcount across both lanes; at or above the
    /// threshold (and with auto-stop enabled) reception is closed
    /// through the settings cache. Repeated calls while the queue stays
    /// long keep reporting `should_stop` without erroring and never
    /// reopen reception.
    pub async fn check_auto_stop(&self, day: EventDay) -> SchedulerResult<AutoStopReport> {
        let lanes = self.classify_lanes(day).await?;
        let waiting_headcount = lanes.waiting_headcount();
        let threshold = self.config().auto_stop_threshold;
        let auto_stop_enabled = self.settings().get().auto_stop_enabled;

        let should_stop = auto_stop_enabled && waiting_headcount >= threshold;
        if should_stop {
            let closed = self.settings().close_reception().await?;
            if closed {
                tracing::warn!(
                    day = %day,
                    headcount = waiting_headcount,
                    threshold,
                    "Waiting headcount over threshold, reception closed"
                );
            }
        }

        Ok(AutoStopReport {
            should_stop,
            waiting_headcount,
            threshold,
            auto_stop_enabled,
        })
    }
}
