//! Core types for the perks engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use roster::VolunteerRank;

use crate::clock::ServiceMonthWindow;

/// Per-job counters gathered in one pass over a volunteer's jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankTally {
    /// Shift jobs inside the service month
    pub shift_jobs: u32,
    /// Shift jobs marked before midnight
    pub before_midnight: u32,
    /// Shift jobs marked after midnight
    pub after_midnight: u32,
    /// Shift jobs whose type has no shift-time distinction
    pub untimed: u32,
    /// Coordination jobs inside the service month
    pub coordination_jobs: u32,
    /// Latest before-midnight or untimed shift in the month
    pub last_before_midnight: Option<DateTime<Utc>>,
    /// Latest after-midnight shift in the month
    pub last_after_midnight: Option<DateTime<Utc>>,
    /// Latest shift of any kind in the month
    pub last_shift: Option<DateTime<Utc>>,
    /// Latest coordination job in the month
    pub last_coordination: Option<DateTime<Utc>>,
    /// Latest coordination job ever started, anchoring the tenure track
    pub tenure_anchor: Option<DateTime<Utc>>,
}

impl RankTally {
    /// Shift jobs counting toward the before-midnight tier.
    pub fn early_shifts(&self) -> u32 {
        self.before_midnight + self.untimed
    }

    /// Most recent job that fed any tiered counter.
    pub fn last_qualifying(&self) -> Option<DateTime<Utc>> {
        self.last_shift.max(self.last_coordination)
    }
}

/// Coordination tenure boundaries, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tenure {
    /// Start of the service day of the anchoring coordination job
    pub start: DateTime<Utc>,
    /// End of Orion, start of Veteran
    pub orion_end: DateTime<Utc>,
    /// End of Veteran
    pub veteran_end: DateTime<Utc>,
}

/// Output of a rank computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankAssessment {
    /// Primary rank, or none
    pub rank: Option<VolunteerRank>,
    /// Every qualifying rank, highest precedence first
    pub qualifying: Vec<VolunteerRank>,
    pub tally: RankTally,
    pub tenure: Option<Tenure>,
    /// Service month the counters cover
    pub window: ServiceMonthWindow,
}

impl RankAssessment {
    pub fn qualifies_for(&self, rank: VolunteerRank) -> bool {
        self.qualifying.contains(&rank)
    }
}

/// Error types for the perks engine.
///
/// Only raised at the configuration boundary; the calculation path itself
/// never fails.
#[derive(Debug, thiserror::Error)]
pub enum PerksError {
    /// Service-day offset outside [-12, 12]
    #[error("Invalid offset hours: {0}")]
    InvalidOffset(i32),

    /// Unknown IANA timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Tier policy values out of range
    #[error("Invalid tier policy: {0}")]
    InvalidPolicy(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Roster data rejected
    #[error("Roster error: {0}")]
    Roster(#[from] roster::RosterError),
}

/// Result type for perks operations.
pub type Result<T> = std::result::Result<T, PerksError>;
