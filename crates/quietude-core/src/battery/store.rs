//! The authoritative energy level store.

use chrono::{DateTime, Utc};

use super::level::{EnergyLevel, LevelChange};
use crate::error::StorageError;
use crate::storage::BatteryDb;

/// Exclusive owner of the current energy level.
///
/// Every other component requests mutations through [`EnergyStore::set`]
/// rather than writing the level itself. A `set` persists the clamped
/// value before the in-memory level is updated, so a failed write leaves
/// the previously-committed value observable and nothing in between.
#[derive(Debug)]
pub struct EnergyStore {
    level: EnergyLevel,
}

impl EnergyStore {
    /// Load the committed level, falling back to the baseline (70) on
    /// first run. The baseline is committed immediately so a crash
    /// before the first mutation still leaves a consistent store.
    pub fn load(db: &BatteryDb, now: DateTime<Utc>) -> Result<Self, StorageError> {
        let level = match db.load_level()? {
            Some(raw) => EnergyLevel::clamped(raw as i64),
            None => {
                db.save_level(EnergyLevel::BASELINE.value(), now)?;
                EnergyLevel::BASELINE
            }
        };
        Ok(Self { level })
    }

    pub fn get(&self) -> EnergyLevel {
        self.level
    }

    /// Clamp `target` into `[0, 100]`, persist it, and report the
    /// transition including whether clamping occurred.
    pub fn set(
        &mut self,
        db: &BatteryDb,
        target: i64,
        at: DateTime<Utc>,
    ) -> Result<LevelChange, StorageError> {
        let applied = EnergyLevel::clamped(target);
        db.save_level(applied.value(), at)?;

        let change = LevelChange {
            previous: self.level,
            requested: target,
            applied,
            clamped: target != applied.value() as i64,
        };
        self.level = applied;
        Ok(change)
    }
}
