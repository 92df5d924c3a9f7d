//! The social energy engine.
//!
//! One explicit state object wires the store, history recorder, event
//! reconciler, overnight checkpoint, and notification bus together.
//! Construct it once and pass it by reference; tests inject an
//! in-memory store through [`EnergyEngine::with_store`].
//!
//! Within a single entry point the ordering guarantee is: store
//! mutation happens-before the history append happens-before the
//! notification. The engine has no internal threads -- lifecycle and
//! timer triggers re-enter it as ordinary synchronous calls
//! ([`EnergyEngine::on_resume`] and [`EnergyEngine::tick`]).

use std::sync::mpsc::Receiver;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::battery::{
    late_night_window, Activity, AppliedActivity, BatteryStatus, EnergyLevel, EnergyStore,
    HistoryEntry, HistoryRecorder, LevelChange, RechargeOutcome, RecordTrigger,
    ScheduledEventReconciler, SleepQuality, SleepRecord, TickSummary,
};
use crate::error::{CoreError, Result, StorageError};
use crate::events::{EngineEvent, EventBus};
use crate::schedule::ScheduledEvent;
use crate::storage::{BatteryDb, Config};

pub struct EnergyEngine {
    db: BatteryDb,
    config: Config,
    store: EnergyStore,
    history: HistoryRecorder,
    reconciler: ScheduledEventReconciler,
    last_recharge: Option<NaiveDate>,
    bus: EventBus,
}

impl EnergyEngine {
    /// Open the engine over the default data directory.
    ///
    /// A corrupt or unopenable store is not fatal: the engine falls
    /// back to an in-memory store with defaults (level 70, empty
    /// history and events, no checkpoint) and logs a warning, matching
    /// the load contract of the persisted document.
    pub fn open() -> Result<Self, StorageError> {
        let config = Config::load_or_default();
        let db = match BatteryDb::open() {
            Ok(db) => db,
            Err(err) => {
                warn!("battery store unavailable, falling back to defaults: {err}");
                BatteryDb::open_memory()?
            }
        };
        Self::with_store(db, config)
    }

    /// Build the engine over an explicit store and config.
    pub fn with_store(db: BatteryDb, config: Config) -> Result<Self, StorageError> {
        let now = Utc::now();
        let purge_cutoff =
            now - TimeDelta::days(config.reconciler.purge_consumed_after_days as i64);
        let purged = db.purge_consumed_before(purge_cutoff)?;
        if purged > 0 {
            debug!("purged {purged} consumed events older than {purge_cutoff}");
        }

        let store = EnergyStore::load(&db, now)?;
        let history = HistoryRecorder::load(
            &db,
            config.battery.history_threshold,
            config.battery.history_max_entries,
        )?;
        let reconciler = ScheduledEventReconciler::load(&db)?;
        let last_recharge = db.load_checkpoint()?;

        Ok(Self {
            db,
            config,
            store,
            history,
            reconciler,
            last_recharge,
            bus: EventBus::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn level(&self) -> EnergyLevel {
        self.store.get()
    }

    pub fn status(&self) -> BatteryStatus {
        self.store.get().status()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        Ok(self.db.list_history(limit)?)
    }

    pub fn sleep_log(&self) -> Result<Vec<SleepRecord>> {
        Ok(self.db.list_sleep()?)
    }

    pub fn events(&self) -> Result<Vec<ScheduledEvent>> {
        Ok(self.db.list_events()?)
    }

    pub fn last_recharge_date(&self) -> Option<NaiveDate> {
        self.last_recharge
    }

    /// Earliest pending scheduled-event due time.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.reconciler.next_due()
    }

    /// Register a notification subscriber.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Manual level set (the battery slider). Recorded in history only
    /// when it crosses the drift threshold.
    pub fn set_level(&mut self, target: i64) -> Result<LevelChange> {
        let now = Utc::now();
        let change = self.store.set(&self.db, target, now)?;
        self.history
            .record(&self.db, change.applied, RecordTrigger::Drift, now)?;
        self.bus.publish(&EngineEvent::LevelSet {
            previous: change.previous,
            level: change.applied,
            clamped: change.clamped,
            at: now,
        });
        Ok(change)
    }

    /// Apply a one-off manual activity delta.
    ///
    /// Out-of-range magnitudes are rejected with a validation error;
    /// an in-range delta that hits the [0,100] boundary is clamped and
    /// the clamp reported in the returned record.
    pub fn log_activity(&mut self, activity: Activity) -> Result<AppliedActivity> {
        activity.validate()?;
        let now = Utc::now();

        let target = self.store.get().value() as i64 + activity.signed_delta();
        let change = self.store.set(&self.db, target, now)?;
        self.history
            .record(&self.db, change.applied, RecordTrigger::Activity, now)?;
        self.bus.publish(&EngineEvent::ActivityLogged {
            name: activity.name.clone(),
            kind: activity.kind,
            delta: activity.energy_delta,
            level: change.applied,
            clamped: change.clamped,
            duration_minutes: activity.duration_minutes,
            at: now,
        });

        Ok(AppliedActivity {
            activity,
            change,
            at: now,
        })
    }

    /// Record sleep quality: apply the fixed adjustment and append an
    /// immutable audit entry.
    pub fn record_sleep_quality(&mut self, quality: SleepQuality) -> Result<SleepRecord> {
        let now = Utc::now();
        let delta = quality.adjustment();

        let target = self.store.get().value() as i64 + delta as i64;
        let change = self.store.set(&self.db, target, now)?;
        self.history
            .record(&self.db, change.applied, RecordTrigger::Sleep, now)?;

        let record = SleepRecord {
            recorded_at: now,
            quality,
            applied_delta: delta,
        };
        self.db.append_sleep(&record)?;

        self.bus.publish(&EngineEvent::SleepRecorded {
            quality,
            delta,
            level: change.applied,
            at: now,
        });
        Ok(record)
    }

    /// Append a calendar event to the event log and index it for
    /// reconciliation. A timestamp already in the past is accepted;
    /// the next tick consumes it.
    pub fn schedule_event(
        &mut self,
        name: impl Into<String>,
        starts_at: DateTime<Utc>,
        energy_cost: u8,
    ) -> Result<ScheduledEvent> {
        if energy_cost == 0 || energy_cost > 100 {
            return Err(CoreError::Validation(
                crate::error::ValidationError::InvalidValue {
                    field: "energy_cost".to_string(),
                    message: format!("must be 1..=100, got {energy_cost}"),
                },
            ));
        }
        let event = ScheduledEvent::new(name, starts_at, energy_cost);
        self.db.insert_event(&event)?;
        self.reconciler.schedule(&event);
        Ok(event)
    }

    /// Lifecycle hook: evaluate the once-per-day overnight recharge.
    ///
    /// Returns `None` when today's evaluation already happened. The
    /// checkpoint advances on every evaluated branch, blocked or not,
    /// so the day is never re-evaluated.
    pub fn on_resume(&mut self, now: DateTime<Utc>) -> Result<Option<RechargeOutcome>> {
        let today = now.date_naive();
        if self.last_recharge == Some(today) {
            return Ok(None);
        }

        let (window_start, window_end) = late_night_window(today);
        let blocked = self.db.any_event_between(window_start, window_end)?;

        let change = if blocked {
            debug!("overnight recharge blocked by a late-night event");
            None
        } else {
            let amount = self.config.recharge.amount as i64;
            let current = self.store.get();
            let (applied, _) = current.offset(amount);
            if applied > current {
                let change = self
                    .store
                    .set(&self.db, current.value() as i64 + amount, now)?;
                self.history.record(
                    &self.db,
                    change.applied,
                    RecordTrigger::OvernightRecharge,
                    now,
                )?;
                self.bus.publish(&EngineEvent::OvernightRecharge {
                    amount: self.config.recharge.amount,
                    level: change.applied,
                    at: now,
                });
                Some(change)
            } else {
                None // already full; nothing to record
            }
        };

        self.db.advance_checkpoint(today)?;
        self.last_recharge = Some(today);

        Ok(Some(RechargeOutcome {
            day: today,
            blocked,
            change,
        }))
    }

    /// One reconciler tick: consume every due, unconsumed event and
    /// apply their aggregate depletion exactly once.
    ///
    /// Each consumption is persisted per event before the aggregate is
    /// applied; an interruption after marking but before the store
    /// write can cost one history entry, never a double depletion. A
    /// store failure mid-tick leaves unprocessed events indexed for the
    /// next interval.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<TickSummary>> {
        let (names, total_cost) = self.reconciler.consume_due(&self.db, now)?;
        if names.is_empty() {
            return Ok(None);
        }

        let target = self.store.get().value() as i64 - total_cost as i64;
        let change = self.store.set(&self.db, target, now)?;
        self.history
            .record(&self.db, change.applied, RecordTrigger::EventConsumption, now)?;
        self.bus.publish(&EngineEvent::EventsConsumed {
            names: names.clone(),
            total_cost,
            level: change.applied,
            at: now,
        });

        debug!(
            "reconciled {} event(s) for a total cost of {total_cost}",
            names.len()
        );
        Ok(Some(TickSummary {
            consumed: names,
            total_cost,
            change,
        }))
    }
}
