//! Once-per-day passive overnight recharge.
//!
//! Lifecycle-triggered, not timer-driven: the host calls the engine's
//! resume hook on start/resume and this module decides whether today's
//! evaluation has already happened. The checkpoint advances exactly once
//! per calendar day, on every branch, so repeated launches on the same
//! day are no-ops and a blocked day is never re-evaluated.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::level::LevelChange;

/// Fixed passive recharge amount.
pub const OVERNIGHT_RECHARGE: u8 = 50;

/// The late-night window `[yesterday 22:00, today 06:00)` for a given
/// calendar day. Any scheduled event inside it, consumed or not, blocks
/// that day's recharge; the presence of late-night activity is the
/// signal, not its energy cost.
pub fn late_night_window(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let yesterday = today - TimeDelta::days(1);
    let start = yesterday
        .and_hms_opt(22, 0, 0)
        .expect("22:00 is a valid time")
        .and_utc();
    let end = today
        .and_hms_opt(6, 0, 0)
        .expect("06:00 is a valid time")
        .and_utc();
    (start, end)
}

/// Result of one overnight evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeOutcome {
    /// The calendar day the checkpoint was advanced to.
    pub day: NaiveDate,
    /// Whether a late-night event suppressed the recharge.
    pub blocked: bool,
    /// The store transition, absent when blocked or already full.
    pub change: Option<LevelChange>,
}
