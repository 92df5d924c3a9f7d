//! Rate-limited time series of level snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::level::EnergyLevel;
use crate::error::StorageError;
use crate::storage::BatteryDb;

/// One snapshot in the battery history series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub level: EnergyLevel,
    pub trigger: RecordTrigger,
}

/// What caused a history snapshot.
///
/// Everything except `Drift` is a forced context: the entry is appended
/// regardless of how small the change was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTrigger {
    /// Manual slider movement or other unattributed change.
    Drift,
    /// A logged recharge/depletion activity.
    Activity,
    /// Sleep-quality adjustment.
    Sleep,
    /// Passive overnight recharge.
    OvernightRecharge,
    /// Scheduled-event consumption by the reconciler.
    EventConsumption,
}

impl RecordTrigger {
    pub fn is_forced(self) -> bool {
        !matches!(self, RecordTrigger::Drift)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordTrigger::Drift => "drift",
            RecordTrigger::Activity => "activity",
            RecordTrigger::Sleep => "sleep",
            RecordTrigger::OvernightRecharge => "overnight_recharge",
            RecordTrigger::EventConsumption => "event_consumption",
        }
    }

    pub fn parse(s: &str) -> RecordTrigger {
        match s {
            "activity" => RecordTrigger::Activity,
            "sleep" => RecordTrigger::Sleep,
            "overnight_recharge" => RecordTrigger::OvernightRecharge,
            "event_consumption" => RecordTrigger::EventConsumption,
            _ => RecordTrigger::Drift,
        }
    }
}

/// Append-only recorder for the history series.
///
/// A snapshot is appended when the absolute change since the last entry
/// reaches the threshold (default 5), or unconditionally for forced
/// triggers. Timestamps are strictly increasing: a clock read at or
/// before the previous entry is nudged one millisecond past it. The
/// series is pruned to `max_entries`, oldest first.
#[derive(Debug)]
pub struct HistoryRecorder {
    last: Option<(DateTime<Utc>, EnergyLevel)>,
    threshold: u8,
    max_entries: usize,
}

impl HistoryRecorder {
    pub fn load(db: &BatteryDb, threshold: u8, max_entries: usize) -> Result<Self, StorageError> {
        let last = db
            .last_history()?
            .map(|entry| (entry.recorded_at, entry.level));
        Ok(Self {
            last,
            threshold,
            max_entries,
        })
    }

    /// Record `level` if it is a significant or source-attributed
    /// transition. Returns the appended entry, if any.
    pub fn record(
        &mut self,
        db: &BatteryDb,
        level: EnergyLevel,
        trigger: RecordTrigger,
        now: DateTime<Utc>,
    ) -> Result<Option<HistoryEntry>, StorageError> {
        let significant = match self.last {
            None => true,
            Some((_, last_level)) => {
                (level.value() as i16 - last_level.value() as i16).unsigned_abs()
                    >= self.threshold as u16
            }
        };
        if !significant && !trigger.is_forced() {
            return Ok(None);
        }

        let recorded_at = match self.last {
            Some((last_at, _)) if now <= last_at => last_at + Duration::milliseconds(1),
            _ => now,
        };

        let entry = HistoryEntry {
            recorded_at,
            level,
            trigger,
        };
        db.append_history(&entry)?;
        db.prune_history(self.max_entries)?;
        self.last = Some((recorded_at, level));
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(db: &BatteryDb) -> HistoryRecorder {
        HistoryRecorder::load(db, 5, 500).unwrap()
    }

    #[test]
    fn small_drift_is_not_recorded() {
        let db = BatteryDb::open_memory().unwrap();
        let mut rec = recorder(&db);
        let now = Utc::now();

        rec.record(&db, EnergyLevel::clamped(70), RecordTrigger::Drift, now)
            .unwrap();
        let appended = rec
            .record(&db, EnergyLevel::clamped(72), RecordTrigger::Drift, now)
            .unwrap();

        assert!(appended.is_none());
        assert_eq!(db.list_history(None).unwrap().len(), 1);
    }

    #[test]
    fn threshold_change_is_recorded() {
        let db = BatteryDb::open_memory().unwrap();
        let mut rec = recorder(&db);
        let now = Utc::now();

        rec.record(&db, EnergyLevel::clamped(70), RecordTrigger::Drift, now)
            .unwrap();
        let appended = rec
            .record(&db, EnergyLevel::clamped(65), RecordTrigger::Drift, now)
            .unwrap();

        assert!(appended.is_some());
    }

    #[test]
    fn forced_trigger_records_tiny_change() {
        let db = BatteryDb::open_memory().unwrap();
        let mut rec = recorder(&db);
        let now = Utc::now();

        rec.record(&db, EnergyLevel::clamped(70), RecordTrigger::Drift, now)
            .unwrap();
        let appended = rec
            .record(&db, EnergyLevel::clamped(71), RecordTrigger::Sleep, now)
            .unwrap();

        assert!(appended.is_some());
    }

    #[test]
    fn timestamps_strictly_increase() {
        let db = BatteryDb::open_memory().unwrap();
        let mut rec = recorder(&db);
        let now = Utc::now();

        // Same clock reading for every call.
        rec.record(&db, EnergyLevel::clamped(70), RecordTrigger::Sleep, now)
            .unwrap();
        rec.record(&db, EnergyLevel::clamped(71), RecordTrigger::Sleep, now)
            .unwrap();
        rec.record(&db, EnergyLevel::clamped(72), RecordTrigger::Sleep, now)
            .unwrap();

        let history = db.list_history(None).unwrap();
        assert_eq!(history.len(), 3);
        for pair in history.windows(2) {
            assert!(pair[1].recorded_at > pair[0].recorded_at);
        }
    }

    #[test]
    fn series_is_pruned_to_cap() {
        let db = BatteryDb::open_memory().unwrap();
        let mut rec = HistoryRecorder::load(&db, 5, 3).unwrap();
        let now = Utc::now();

        for i in 0..6 {
            rec.record(
                &db,
                EnergyLevel::clamped(50 + i),
                RecordTrigger::Sleep,
                now,
            )
            .unwrap();
        }

        let history = db.list_history(None).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().unwrap().level.value(), 55);
    }
}
