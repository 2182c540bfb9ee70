//! Unique timer wrapper.
//!
//! Models the external "timer service" collaborator named in the original
//! spec §6 (`unique_timer::set/run/stop/has_expired`) on top of
//! `tokio::time`, which is the teacher stack's async runtime. Per that
//! section's contract, callbacks fire on the same executor that called
//! `set` — true here because `tokio::time::sleep` is driven by the same
//! Tokio runtime the rest of the core runs on.

use std::time::Duration;

use tokio::sync::oneshot;

/// Outcome of awaiting a [`UniqueTimer`] (original spec §4.1 "Timer wait").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Expired,
    Stopped,
}

/// A single-shot, stoppable timer. Each `set` call arms a new race between
/// the sleep and an explicit `stop`; only one of the two ever wins.
pub struct UniqueTimer {
    stop_tx: Option<oneshot::Sender<()>>,
}

impl UniqueTimer {
    pub fn new() -> Self {
        Self { stop_tx: None }
    }

    /// Arms the timer for `duration` and suspends until it expires or is
    /// stopped. Re-arming (calling `wait` again) replaces any prior race.
    pub async fn wait(&mut self, duration: Duration) -> TimerOutcome {
        let (tx, rx) = oneshot::channel();
        self.stop_tx = Some(tx);
        tokio::select! {
            _ = tokio::time::sleep(duration) => TimerOutcome::Expired,
            _ = rx => TimerOutcome::Stopped,
        }
    }

    /// Stops a pending timer. A no-op if the timer already expired or was
    /// never armed.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Default for UniqueTimer {
    fn default() -> Self {
        Self::new()
    }
}
