//! The bounded energy level and its status tiers.

use serde::{Deserialize, Serialize};

/// Remaining social capacity, always within `[0, 100]`.
///
/// The only way to construct one is through [`EnergyLevel::clamped`],
/// so an out-of-range level is unrepresentable outside deserialization
/// of hand-edited data (which the store re-clamps on load).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnergyLevel(u8);

impl EnergyLevel {
    pub const MIN: EnergyLevel = EnergyLevel(0);
    pub const MAX: EnergyLevel = EnergyLevel(100);

    /// First-run default.
    pub const BASELINE: EnergyLevel = EnergyLevel(70);

    /// Clamp an arbitrary value into the valid range.
    pub fn clamped(raw: i64) -> Self {
        EnergyLevel(raw.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Apply a signed delta, clamping at the bounds.
    ///
    /// Returns the new level and whether clamping occurred.
    pub fn offset(self, delta: i64) -> (EnergyLevel, bool) {
        let requested = self.0 as i64 + delta;
        let applied = EnergyLevel::clamped(requested);
        (applied, requested != applied.0 as i64)
    }

    pub fn status(self) -> BatteryStatus {
        BatteryStatus::for_level(self)
    }
}

impl std::fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Outcome of a store mutation.
///
/// `requested` is the raw target before clamping; `clamped` reports
/// whether the bounds were hit, so callers can surface it instead of
/// silently absorbing it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelChange {
    pub previous: EnergyLevel,
    pub requested: i64,
    pub applied: EnergyLevel,
    pub clamped: bool,
}

impl LevelChange {
    /// Signed difference actually applied.
    pub fn delta(&self) -> i64 {
        self.applied.value() as i64 - self.previous.value() as i64
    }

    /// Whether the mutation changed the level at all.
    pub fn changed(&self) -> bool {
        self.applied != self.previous
    }
}

/// User-facing battery tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryStatus {
    Critical,
    Low,
    Moderate,
    Good,
    Excellent,
}

impl BatteryStatus {
    /// Tier thresholds: <20 critical, <40 low, <60 moderate, <80 good.
    pub fn for_level(level: EnergyLevel) -> Self {
        match level.value() {
            0..=19 => BatteryStatus::Critical,
            20..=39 => BatteryStatus::Low,
            40..=59 => BatteryStatus::Moderate,
            60..=79 => BatteryStatus::Good,
            _ => BatteryStatus::Excellent,
        }
    }

    /// Human-readable status message.
    pub fn message(&self) -> &'static str {
        match self {
            BatteryStatus::Critical => "Critical - Time to recharge!",
            BatteryStatus::Low => "Low - Consider taking a break soon",
            BatteryStatus::Moderate => "Moderate - Be mindful of your energy",
            BatteryStatus::Good => "Good - You have plenty of social energy",
            BatteryStatus::Excellent => "Excellent - Your social battery is fully charged",
        }
    }
}
