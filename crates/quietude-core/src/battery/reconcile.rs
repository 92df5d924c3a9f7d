//! Scheduled-event reconciliation.
//!
//! Instead of rescanning the full event list on every tick, the
//! reconciler keeps a min-heap of unconsumed `(starts_at, id)` pairs,
//! seeded from the store at construction and pushed on every newly
//! scheduled event. A tick pops everything due and consumes each event
//! through an atomic compare-and-set in the store; only a winning CAS
//! contributes its cost. Consumption is persisted per event, before the
//! aggregate depletion is applied, so an interrupted tick can never
//! reconsider an already-consumed event.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::level::LevelChange;
use crate::error::StorageError;
use crate::schedule::ScheduledEvent;
use crate::storage::BatteryDb;

/// Heap entry ordered by due time, then id for determinism.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DueEntry {
    starts_at: DateTime<Utc>,
    id: String,
}

/// Min-heap index over due, unconsumed scheduled events.
///
/// The heap is an in-memory index only; the consumed flags in the store
/// are the durable truth, so a restart rebuilds exactly the pending set.
#[derive(Debug)]
pub struct ScheduledEventReconciler {
    due: BinaryHeap<Reverse<DueEntry>>,
}

impl ScheduledEventReconciler {
    /// Seed the heap from every unconsumed event in the store.
    pub fn load(db: &BatteryDb) -> Result<Self, StorageError> {
        let mut due = BinaryHeap::new();
        for event in db.unconsumed_events()? {
            due.push(Reverse(DueEntry {
                starts_at: event.starts_at,
                id: event.id,
            }));
        }
        Ok(Self { due })
    }

    /// Index a newly scheduled event. A past timestamp is accepted and
    /// will be picked up by the next tick.
    pub fn schedule(&mut self, event: &ScheduledEvent) {
        self.due.push(Reverse(DueEntry {
            starts_at: event.starts_at,
            id: event.id.clone(),
        }));
    }

    /// Earliest pending due time, if any. Hosts can sleep until this
    /// instead of polling blindly.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.due.peek().map(|Reverse(entry)| entry.starts_at)
    }

    pub fn pending(&self) -> usize {
        self.due.len()
    }

    /// Pop every entry with `starts_at <= now`, consuming each through
    /// the store's compare-and-set. Returns the names and aggregate cost
    /// of the events this call actually consumed.
    ///
    /// On a store failure the entry being processed is pushed back and
    /// the error returned, so the tick is retried on the next interval
    /// with nothing lost; everything popped earlier was already durably
    /// consumed. Events whose CAS lost (another engine instance consumed
    /// them first) are dropped silently.
    pub fn consume_due(
        &mut self,
        db: &BatteryDb,
        now: DateTime<Utc>,
    ) -> Result<(Vec<String>, u32), StorageError> {
        let mut names = Vec::new();
        let mut total_cost: u32 = 0;

        while let Some(Reverse(entry)) = self.due.peek().cloned() {
            if entry.starts_at > now {
                break;
            }
            self.due.pop();

            match db.consume_event(&entry.id) {
                Ok(Some((name, cost))) => {
                    names.push(name);
                    total_cost += cost as u32;
                }
                Ok(None) => {} // already consumed elsewhere
                Err(err) => {
                    self.due.push(Reverse(entry));
                    return Err(err);
                }
            }
        }

        Ok((names, total_cost))
    }
}

/// Summary of one reconciler tick that consumed at least one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSummary {
    pub consumed: Vec<String>,
    pub total_cost: u32,
    pub change: LevelChange,
}
