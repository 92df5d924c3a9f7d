//! Engine notifications and the publish/subscribe bus.
//!
//! Every applied mutation produces an [`EngineEvent`]. UI collaborators
//! subscribe through [`EventBus`] and render the summaries however they
//! like (toast, snackbar, stdout); the engine itself never talks to a
//! display.

use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battery::{ActivityKind, EnergyLevel, SleepQuality};

/// A mutation applied by the engine, described for UI collaborators.
///
/// Each variant carries the source, the magnitude, and the resulting
/// level; `summary`/`detail` provide toast-style copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// Manual level set (the battery slider).
    LevelSet {
        previous: EnergyLevel,
        level: EnergyLevel,
        clamped: bool,
        at: DateTime<Utc>,
    },
    /// A one-off activity was logged.
    ActivityLogged {
        name: String,
        kind: ActivityKind,
        delta: u8,
        level: EnergyLevel,
        clamped: bool,
        duration_minutes: u32,
        at: DateTime<Utc>,
    },
    /// Sleep quality was recorded and the fixed adjustment applied.
    SleepRecorded {
        quality: SleepQuality,
        delta: i8,
        level: EnergyLevel,
        at: DateTime<Utc>,
    },
    /// The once-per-day passive overnight recharge fired.
    OvernightRecharge {
        amount: u8,
        level: EnergyLevel,
        at: DateTime<Utc>,
    },
    /// One reconciler tick consumed due scheduled events.
    EventsConsumed {
        names: Vec<String>,
        total_cost: u32,
        level: EnergyLevel,
        at: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// When the mutation was applied.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            EngineEvent::LevelSet { at, .. }
            | EngineEvent::ActivityLogged { at, .. }
            | EngineEvent::SleepRecorded { at, .. }
            | EngineEvent::OvernightRecharge { at, .. }
            | EngineEvent::EventsConsumed { at, .. } => *at,
        }
    }

    /// Toast-style headline for this mutation.
    pub fn summary(&self) -> String {
        match self {
            EngineEvent::LevelSet { level, .. } => {
                format!("Battery set to {}%", level.value())
            }
            EngineEvent::ActivityLogged { kind, delta, .. } => match kind {
                ActivityKind::Recharge => format!("Battery recharged by {delta}%"),
                ActivityKind::Depletion => format!("Battery depleted by {delta}%"),
            },
            EngineEvent::SleepRecorded { delta, .. } => {
                if *delta >= 0 {
                    format!("Battery recharged by {delta}%")
                } else {
                    format!("Battery reduced by {}%", delta.unsigned_abs())
                }
            }
            EngineEvent::OvernightRecharge { amount, .. } => {
                format!("Battery recharged by {amount}%")
            }
            EngineEvent::EventsConsumed { names, .. } => {
                if names.len() == 1 {
                    format!("Energy depleted for event: {}", names[0])
                } else {
                    format!("Energy depleted for {} events", names.len())
                }
            }
        }
    }

    /// Toast-style supporting line for this mutation.
    pub fn detail(&self) -> String {
        match self {
            EngineEvent::LevelSet { previous, clamped, .. } => {
                if *clamped {
                    format!("Adjusted from {}% (requested value was clamped)", previous.value())
                } else {
                    format!("Adjusted from {}%", previous.value())
                }
            }
            EngineEvent::ActivityLogged { name, duration_minutes, .. } => {
                format!("{name} ({duration_minutes} min)")
            }
            EngineEvent::SleepRecorded { quality, delta, .. } => {
                if *delta >= 0 {
                    format!("{} sleep has restored your social energy", quality.label())
                } else {
                    format!("{} sleep has depleted your social energy", quality.label())
                }
            }
            EngineEvent::OvernightRecharge { .. } => {
                "Overnight rest has restored your social energy".to_string()
            }
            EngineEvent::EventsConsumed { names, total_cost, .. } => {
                if names.len() == 1 {
                    format!(
                        "Your social battery decreased by {total_cost}% as the scheduled time arrived"
                    )
                } else {
                    format!(
                        "Your social battery decreased by {total_cost}% as the scheduled times arrived"
                    )
                }
            }
        }
    }
}

/// Explicit typed publish/subscribe channel between the engine and its
/// UI collaborators.
///
/// Subscribers receive every event published after they subscribed.
/// Disconnected subscribers are dropped on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Vec<Sender<EngineEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn publish(&mut self, event: &EngineEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last publish).
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}
