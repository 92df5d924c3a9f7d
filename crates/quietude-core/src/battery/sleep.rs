//! Sleep-quality adjustment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reported sleep quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Good,
    Medium,
    Bad,
}

impl SleepQuality {
    /// Fixed battery adjustment for this tier.
    pub fn adjustment(self) -> i8 {
        match self {
            SleepQuality::Good => 50,
            SleepQuality::Medium => 10,
            SleepQuality::Bad => -5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SleepQuality::Good => "Good",
            SleepQuality::Medium => "Medium",
            SleepQuality::Bad => "Bad",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SleepQuality::Good => "good",
            SleepQuality::Medium => "medium",
            SleepQuality::Bad => "bad",
        }
    }

    pub fn parse(s: &str) -> Option<SleepQuality> {
        match s {
            "good" => Some(SleepQuality::Good),
            "medium" => Some(SleepQuality::Medium),
            "bad" => Some(SleepQuality::Bad),
            _ => None,
        }
    }
}

/// Immutable audit entry for one recorded night of sleep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRecord {
    pub recorded_at: DateTime<Utc>,
    pub quality: SleepQuality,
    /// The delta actually requested from the store (pre-clamp).
    pub applied_delta: i8,
}
