//! Social battery engine.
//!
//! The battery is a bounded [0,100] energy resource mutated from several
//! independent sources: manual activity logging, sleep-quality
//! adjustment, a once-per-day passive overnight recharge, and scheduled
//! calendar events that deplete energy at their start time. Every
//! mutation flows through [`EnergyStore`]; significant transitions land
//! in the [`HistoryRecorder`] series.

mod activity;
mod history;
mod level;
mod recharge;
mod reconcile;
mod sleep;
mod store;

pub use activity::{Activity, ActivityKind, AppliedActivity};
pub use history::{HistoryEntry, HistoryRecorder, RecordTrigger};
pub use level::{BatteryStatus, EnergyLevel, LevelChange};
pub use recharge::{late_night_window, RechargeOutcome, OVERNIGHT_RECHARGE};
pub use reconcile::{ScheduledEventReconciler, TickSummary};
pub use sleep::{SleepQuality, SleepRecord};
pub use store::EnergyStore;
