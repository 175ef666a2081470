//! Completion rollover
//!
//! After a group completes, a countdown runs and then resets the group
//! so the next candidate surfaces. The countdown is cancellable (the
//! operator navigating away cancels it without applying the reset), and
//! scheduling a new countdown for a day replaces any pending one. A
//! cancelled countdown never advances group state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;
use shared::models::EventDay;

/// Cancellable post-completion reset timer, one slot per day
pub struct RolloverTimer {
    scheduler: Arc<Scheduler>,
    delay: Duration,
    root: CancellationToken,
    pending: Mutex<[Option<CancellationToken>; 2]>,
}

impl RolloverTimer {
    /// `root` ties every countdown to server shutdown
    pub fn new(scheduler: Arc<Scheduler>, delay: Duration, root: CancellationToken) -> Self {
        Self {
            scheduler,
            delay,
            root,
            pending: Mutex::new([None, None]),
        }
    }

    /// Start the countdown for a completed group, replacing any pending
    /// countdown for the same day.
    pub fn schedule(&self, day: EventDay, number: u32) {
        let token = self.root.child_token();
        {
            let mut pending = self.pending.lock();
            if let Some(previous) = pending[day.index()].replace(token.clone()) {
                previous.cancel();
            }
        }

        let scheduler = self.scheduler.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(day = %day, group = number, "Rollover cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    match scheduler.reset_group(day, number).await {
                        Ok(()) => {
                            tracing::info!(day = %day, group = number, "Rollover reset applied");
                        }
                        Err(err) => {
                            tracing::warn!(day = %day, group = number, error = %err, "Rollover reset failed");
                        }
                    }
                }
            }
        });
        tracing::debug!(day = %day, group = number, delay_secs = delay.as_secs(), "Rollover scheduled");
    }

    /// Cancel the pending countdown for a day, if any. The reset is not
    /// applied early.
    pub fn cancel(&self, day: EventDay) -> bool {
        let mut pending = self.pending.lock();
        match pending[day.index()].take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}
