//! SQLite-based storage for the battery engine.
//!
//! One database file holds the five persisted keys of the engine:
//! the committed level, the history series, the scheduled-event log,
//! the sleep audit log, and the overnight-recharge checkpoint.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::battery::{EnergyLevel, HistoryEntry, RecordTrigger, SleepQuality, SleepRecord};
use crate::error::StorageError;
use crate::schedule::ScheduledEvent;

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a ScheduledEvent from a database row
fn row_to_event(row: &rusqlite::Row) -> Result<ScheduledEvent, rusqlite::Error> {
    let starts_at_str: String = row.get(2)?;
    Ok(ScheduledEvent {
        id: row.get(0)?,
        name: row.get(1)?,
        starts_at: parse_datetime_fallback(&starts_at_str),
        energy_cost: row.get::<_, i64>(3)? as u8,
        consumed: row.get::<_, i64>(4)? != 0,
    })
}

/// Build a HistoryEntry from a database row
fn row_to_history(row: &rusqlite::Row) -> Result<HistoryEntry, rusqlite::Error> {
    let recorded_at_str: String = row.get(0)?;
    let trigger_str: String = row.get(2)?;
    Ok(HistoryEntry {
        recorded_at: parse_datetime_fallback(&recorded_at_str),
        level: EnergyLevel::clamped(row.get::<_, i64>(1)?),
        trigger: RecordTrigger::parse(&trigger_str),
    })
}

/// SQLite store at `~/.config/quietude/quietude.db`.
pub struct BatteryDb {
    conn: Connection,
}

impl BatteryDb {
    /// Open the battery store in the default data directory.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::DataDir(e.to_string()))?
            .join("quietude.db");
        Self::open_at(&path)
    }

    /// Open the battery store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory store (for tests and the corrupt-store
    /// fallback path).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS battery_state (
                    id         INTEGER PRIMARY KEY CHECK (id = 1),
                    level      INTEGER NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS battery_history (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    recorded_at  TEXT NOT NULL,
                    level        INTEGER NOT NULL,
                    trigger_kind TEXT NOT NULL DEFAULT 'drift'
                );

                CREATE TABLE IF NOT EXISTS scheduled_events (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    starts_at   TEXT NOT NULL,
                    energy_cost INTEGER NOT NULL,
                    consumed    INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS sleep_log (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    recorded_at   TEXT NOT NULL,
                    quality       TEXT NOT NULL,
                    applied_delta INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recharge_checkpoint (
                    id                 INTEGER PRIMARY KEY CHECK (id = 1),
                    last_recharge_date TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_events_due
                    ON scheduled_events(consumed, starts_at);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    // === Level ===

    pub fn load_level(&self) -> Result<Option<u8>, StorageError> {
        let level: Option<i64> = self
            .conn
            .query_row("SELECT level FROM battery_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(level.map(|l| l.clamp(0, 100) as u8))
    }

    pub fn save_level(&self, level: u8, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO battery_state (id, level, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET level = ?1, updated_at = ?2",
            params![level as i64, at.to_rfc3339()],
        )?;
        Ok(())
    }

    // === History ===

    pub fn append_history(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO battery_history (recorded_at, level, trigger_kind) VALUES (?1, ?2, ?3)",
            params![
                entry.recorded_at.to_rfc3339(),
                entry.level.value() as i64,
                entry.trigger.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn last_history(&self) -> Result<Option<HistoryEntry>, StorageError> {
        let entry = self
            .conn
            .query_row(
                "SELECT recorded_at, level, trigger_kind FROM battery_history
                 ORDER BY id DESC LIMIT 1",
                [],
                row_to_history,
            )
            .optional()?;
        Ok(entry)
    }

    /// Time-ordered history, oldest first. `limit` takes the newest N.
    pub fn list_history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, StorageError> {
        let mut entries = match limit {
            Some(n) => {
                let mut stmt = self.conn.prepare(
                    "SELECT recorded_at, level, trigger_kind FROM battery_history
                     ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![n as i64], row_to_history)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT recorded_at, level, trigger_kind FROM battery_history ORDER BY id DESC",
                )?;
                let rows = stmt.query_map([], row_to_history)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        entries.reverse();
        Ok(entries)
    }

    /// Drop the oldest entries beyond `max`. Returns how many were removed.
    pub fn prune_history(&self, max: usize) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM battery_history WHERE id NOT IN (
                 SELECT id FROM battery_history ORDER BY id DESC LIMIT ?1
             )",
            params![max as i64],
        )?;
        Ok(removed)
    }

    // === Scheduled events ===

    pub fn insert_event(&self, event: &ScheduledEvent) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO scheduled_events (id, name, starts_at, energy_cost, consumed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.name,
                event.starts_at.to_rfc3339(),
                event.energy_cost as i64,
                event.consumed as i64,
            ],
        )?;
        Ok(())
    }

    pub fn list_events(&self) -> Result<Vec<ScheduledEvent>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, starts_at, energy_cost, consumed FROM scheduled_events
             ORDER BY starts_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_event)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn unconsumed_events(&self) -> Result<Vec<ScheduledEvent>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, starts_at, energy_cost, consumed FROM scheduled_events
             WHERE consumed = 0 ORDER BY starts_at ASC",
        )?;
        let rows = stmt.query_map([], row_to_event)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Atomically mark an event consumed.
    ///
    /// The one-shot flag is a compare-and-set: only the caller whose
    /// UPDATE actually flipped the flag gets the event's name and cost
    /// back, so two engine instances sharing a store cannot both apply
    /// the same depletion.
    pub fn consume_event(&self, id: &str) -> Result<Option<(String, u8)>, StorageError> {
        let changed = self.conn.execute(
            "UPDATE scheduled_events SET consumed = 1 WHERE id = ?1 AND consumed = 0",
            params![id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let row = self
            .conn
            .query_row(
                "SELECT name, energy_cost FROM scheduled_events WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u8)),
            )
            .optional()?;
        Ok(row)
    }

    /// Whether any event, consumed or not, starts inside `[start, end)`.
    pub fn any_event_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scheduled_events WHERE starts_at >= ?1 AND starts_at < ?2",
            params![start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Purge consumed events older than `cutoff`. Returns how many were
    /// removed.
    pub fn purge_consumed_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM scheduled_events WHERE consumed = 1 AND starts_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(removed)
    }

    // === Sleep log ===

    pub fn append_sleep(&self, record: &SleepRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sleep_log (recorded_at, quality, applied_delta) VALUES (?1, ?2, ?3)",
            params![
                record.recorded_at.to_rfc3339(),
                record.quality.as_str(),
                record.applied_delta as i64,
            ],
        )?;
        Ok(())
    }

    pub fn list_sleep(&self) -> Result<Vec<SleepRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT recorded_at, quality, applied_delta FROM sleep_log ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let recorded_at_str: String = row.get(0)?;
            let quality_str: String = row.get(1)?;
            Ok(SleepRecord {
                recorded_at: parse_datetime_fallback(&recorded_at_str),
                quality: SleepQuality::parse(&quality_str).unwrap_or(SleepQuality::Medium),
                applied_delta: row.get::<_, i64>(2)? as i8,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // === Recharge checkpoint ===

    pub fn load_checkpoint(&self) -> Result<Option<NaiveDate>, StorageError> {
        let date: Option<String> = self
            .conn
            .query_row(
                "SELECT last_recharge_date FROM recharge_checkpoint WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()))
    }

    /// Advance the checkpoint to `day`. The checkpoint is monotonically
    /// non-decreasing: an earlier date than the stored one is ignored.
    pub fn advance_checkpoint(&self, day: NaiveDate) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO recharge_checkpoint (id, last_recharge_date) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET last_recharge_date = MAX(last_recharge_date, ?1)",
            params![day.format("%Y-%m-%d").to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn level_roundtrip() {
        let db = BatteryDb::open_memory().unwrap();
        assert_eq!(db.load_level().unwrap(), None);

        db.save_level(70, Utc::now()).unwrap();
        assert_eq!(db.load_level().unwrap(), Some(70));

        db.save_level(35, Utc::now()).unwrap();
        assert_eq!(db.load_level().unwrap(), Some(35));
    }

    #[test]
    fn consume_event_is_one_shot() {
        let db = BatteryDb::open_memory().unwrap();
        let event = ScheduledEvent::new("Dinner", Utc::now(), 20);
        db.insert_event(&event).unwrap();

        let first = db.consume_event(&event.id).unwrap();
        assert_eq!(first, Some(("Dinner".to_string(), 20)));

        let second = db.consume_event(&event.id).unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn window_query_includes_start_excludes_end() {
        let db = BatteryDb::open_memory().unwrap();
        let start = Utc::now();
        let end = start + TimeDelta::hours(8);

        db.insert_event(&ScheduledEvent::new("At start", start, 10))
            .unwrap();
        assert!(db.any_event_between(start, end).unwrap());

        let db = BatteryDb::open_memory().unwrap();
        db.insert_event(&ScheduledEvent::new("At end", end, 10))
            .unwrap();
        assert!(!db.any_event_between(start, end).unwrap());
    }

    #[test]
    fn checkpoint_never_moves_backward() {
        let db = BatteryDb::open_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let yesterday = today - TimeDelta::days(1);

        db.advance_checkpoint(today).unwrap();
        db.advance_checkpoint(yesterday).unwrap();

        assert_eq!(db.load_checkpoint().unwrap(), Some(today));
    }

    #[test]
    fn purge_keeps_unconsumed_events() {
        let db = BatteryDb::open_memory().unwrap();
        let old = Utc::now() - TimeDelta::days(60);

        let consumed = ScheduledEvent::new("Old party", old, 20);
        db.insert_event(&consumed).unwrap();
        db.consume_event(&consumed.id).unwrap();
        db.insert_event(&ScheduledEvent::new("Old but pending", old, 20))
            .unwrap();

        let removed = db
            .purge_consumed_before(Utc::now() - TimeDelta::days(30))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.list_events().unwrap().len(), 1);
    }

    #[test]
    fn sleep_log_roundtrip() {
        let db = BatteryDb::open_memory().unwrap();
        db.append_sleep(&SleepRecord {
            recorded_at: Utc::now(),
            quality: SleepQuality::Good,
            applied_delta: 50,
        })
        .unwrap();

        let log = db.list_sleep().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].quality, SleepQuality::Good);
        assert_eq!(log[0].applied_delta, 50);
    }
}
