//! # Quietude Core Library
//!
//! This library provides the social energy management engine for
//! Quietude, a wellbeing app for introverts. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI
//! binary, with any GUI shell being a thin layer over the same core
//! library.
//!
//! ## Architecture
//!
//! - **Battery**: a bounded [0,100] energy resource mutated by manual
//!   activity logging, sleep-quality adjustment, a once-per-day passive
//!   overnight recharge, and scheduled events that deplete energy at
//!   their start time
//! - **Engine**: an explicit state object tying the store, history,
//!   reconciler, checkpoint, and notification bus together; callers
//!   drive it with lifecycle hooks and periodic `tick()` calls
//! - **Storage**: SQLite-based state storage and TOML-based
//!   configuration
//! - **Events**: typed publish/subscribe notifications for UI
//!   collaborators
//!
//! ## Key Components
//!
//! - [`EnergyEngine`]: the engine entry surface
//! - [`EnergyStore`]: the authoritative, clamped energy level
//! - [`ScheduledEventReconciler`]: exactly-once event depletion
//! - [`BatteryDb`]: state persistence
//! - [`Config`]: engine configuration management

pub mod battery;
pub mod engine;
pub mod error;
pub mod events;
pub mod runner;
pub mod schedule;
pub mod storage;

pub use battery::{
    Activity, ActivityKind, AppliedActivity, BatteryStatus, EnergyLevel, EnergyStore,
    HistoryEntry, HistoryRecorder, LevelChange, RechargeOutcome, RecordTrigger,
    ScheduledEventReconciler, SleepQuality, SleepRecord, TickSummary,
};
pub use engine::EnergyEngine;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{EngineEvent, EventBus};
pub use runner::ReconcilerRunner;
pub use schedule::ScheduledEvent;
pub use storage::{BatteryDb, Config};
