//! Interval-driven reconciler loop.
//!
//! The engine itself is tick-based with no internal threads; this
//! module is the host-side plumbing that supplies the ticks. The
//! returned handle owns the interval timer: dropping it aborts the
//! background task, so a torn-down owner can never leave a leaked
//! timer mutating state behind it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::EnergyEngine;

/// Handle to a running reconciler loop. Aborts the loop on drop.
pub struct ReconcilerRunner {
    handle: JoinHandle<()>,
}

impl ReconcilerRunner {
    /// Spawn an interval loop driving `engine.tick()`.
    ///
    /// The first tick fires immediately (the reconciler runs on mount
    /// as well as on the interval). A failed tick is logged and retried
    /// on the next interval; the events it could not process stay
    /// indexed. Must be called within a tokio runtime.
    pub fn spawn(engine: Arc<Mutex<EnergyEngine>>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let mut engine = match engine.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Err(err) = engine.tick(Utc::now()) {
                    warn!("reconciler tick skipped: {err}");
                }
            }
        });
        Self { handle }
    }

    /// Stop the loop explicitly. Equivalent to dropping the handle.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for ReconcilerRunner {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
