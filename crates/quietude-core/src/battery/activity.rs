//! Manual activity logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::level::LevelChange;
use crate::error::ValidationError;

/// Direction of a logged activity's energy effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Restores energy (quiet reading, a walk alone).
    Recharge,
    /// Drains energy (meetings, parties, calls).
    Depletion,
}

/// A user-selected activity with a one-off energy effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub kind: ActivityKind,
    /// Magnitude of the effect, `1..=100`.
    pub energy_delta: u8,
    pub duration_minutes: u32,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        kind: ActivityKind,
        energy_delta: u8,
        duration_minutes: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            energy_delta,
            duration_minutes,
        }
    }

    /// Reject out-of-range magnitudes instead of silently clamping them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.energy_delta == 0 || self.energy_delta > 100 {
            return Err(ValidationError::InvalidValue {
                field: "energy_delta".to_string(),
                message: format!("must be 1..=100, got {}", self.energy_delta),
            });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Signed delta: positive for recharge, negative for depletion.
    pub fn signed_delta(&self) -> i64 {
        match self.kind {
            ActivityKind::Recharge => self.energy_delta as i64,
            ActivityKind::Depletion => -(self.energy_delta as i64),
        }
    }
}

/// Record returned to the caller after an activity is applied,
/// for UI feedback ("battery recharged by N%").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedActivity {
    pub activity: Activity,
    pub change: LevelChange,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_delta_follows_kind() {
        let recharge = Activity::new("Reading", ActivityKind::Recharge, 20, 60);
        assert_eq!(recharge.signed_delta(), 20);

        let depletion = Activity::new("Team meeting", ActivityKind::Depletion, 15, 30);
        assert_eq!(depletion.signed_delta(), -15);
    }

    #[test]
    fn validate_rejects_out_of_range_magnitude() {
        let zero = Activity::new("Nothing", ActivityKind::Recharge, 0, 10);
        assert!(zero.validate().is_err());

        let too_big = Activity::new("Everything", ActivityKind::Depletion, 101, 10);
        assert!(too_big.validate().is_err());

        let ok = Activity::new("A walk", ActivityKind::Recharge, 100, 45);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let blank = Activity::new("  ", ActivityKind::Recharge, 10, 10);
        assert!(blank.validate().is_err());
    }
}
