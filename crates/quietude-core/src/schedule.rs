//! Calendar event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar-anchored, one-shot energy depletion trigger.
///
/// Created by the calendar collaborator; `consumed` is set exactly once
/// by the reconciler and a consumed event never contributes to a level
/// change again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: String,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    /// Battery percentage drained when the event starts, `1..=100`.
    pub energy_cost: u8,
    pub consumed: bool,
}

impl ScheduledEvent {
    pub fn new(name: impl Into<String>, starts_at: DateTime<Utc>, energy_cost: u8) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            starts_at,
            energy_cost,
            consumed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_events_start_unconsumed_with_unique_ids() {
        let at = Utc::now();
        let a = ScheduledEvent::new("Dinner", at, 20);
        let b = ScheduledEvent::new("Dinner", at, 20);
        assert!(!a.consumed);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn event_serialization() {
        let event = ScheduledEvent::new("Book club", Utc::now(), 15);
        let json = serde_json::to_string(&event).unwrap();
        let decoded: ScheduledEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.name, "Book club");
        assert_eq!(decoded.energy_cost, 15);
    }
}
