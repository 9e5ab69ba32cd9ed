//! Core types for volunteer rewards.
//!
//! Volunteers perform dated jobs; each job references a job-type configuration
//! by name, and the configuration decides whether the job feeds the tiered rank
//! counters or grants a fixed manual reward bundle.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for the dashboard and detail panels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Volunteer identifier, as assigned by the persistence layer.
pub type VolunteerId = i64;

/// Error types for roster data and input providers.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// Two job-type configurations share a name
    #[error("Duplicate job type: {0}")]
    DuplicateJobType(String),

    /// A manual-system job type carries no reward bundle
    #[error("Manual job type without rewards: {0}")]
    MissingManualRewards(String),

    /// Reward bundle values out of range
    #[error("Invalid manual rewards for {name}: {reason}")]
    InvalidManualRewards { name: String, reason: String },

    /// Input provider failure
    #[error("Source error: {0}")]
    Source(String),
}

/// Result type for roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;

/// Longest reward or tenure period accepted at the configuration boundary.
pub const MAX_DURATION_DAYS: u32 = 36_500;

/// Self-declared gender of a volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    Other,
    PreferNotToDisclose,
}

/// A volunteer as stored by the persistence layer. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Volunteer {
    /// Unique identifier
    pub id: VolunteerId,
    /// Display name
    pub name: String,
    /// Abbreviated last name shown on guest lists
    #[serde(default)]
    pub last_name_abbreviation: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    /// Free-form date of birth as entered
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Manually assigned rank; only `Special` bypasses the counters
    #[serde(default)]
    pub rank_override: Option<VolunteerRank>,
    /// Maintained by the activity tracker (see [`crate::activity`])
    pub is_active: bool,
    /// Date of the most recent job, maintained by the activity tracker
    #[serde(default)]
    pub last_shift_date: Option<DateTime<Utc>>,
}

impl Volunteer {
    /// Create an active volunteer with only identity fields set.
    pub fn new(id: VolunteerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            last_name_abbreviation: String::new(),
            email: String::new(),
            phone_number: String::new(),
            date_of_birth: String::new(),
            gender: None,
            rank_override: None,
            is_active: true,
            last_shift_date: None,
        }
    }

    /// Builder: set the manual rank override.
    pub fn with_rank_override(mut self, rank: VolunteerRank) -> Self {
        self.rank_override = Some(rank);
        self
    }

    /// Builder: set the activity flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether the volunteer holds the manual `Special` override.
    pub fn has_special_override(&self) -> bool {
        self.rank_override == Some(VolunteerRank::Special)
    }
}

/// Which side of midnight a shift was worked on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftTime {
    #[default]
    BeforeMidnight,
    AfterMidnight,
}

/// A recorded job. Immutable once created except through explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Job {
    /// Unique identifier
    pub id: i64,
    /// Owning volunteer; `None` while unassigned
    pub volunteer_id: Option<VolunteerId>,
    /// Name of the job-type configuration (names are unique)
    pub job_type_name: String,
    pub venue_name: String,
    /// When the job took place
    pub date: DateTime<Utc>,
    /// Only meaningful when the job type requires it
    #[serde(default)]
    pub shift_time: ShiftTime,
    #[serde(default)]
    pub notes: String,
    /// Last modification, used by incremental consumers
    pub last_modified: DateTime<Utc>,
}

impl Job {
    /// Create a job assigned to a volunteer.
    pub fn new(
        id: i64,
        volunteer_id: VolunteerId,
        job_type_name: impl Into<String>,
        venue_name: impl Into<String>,
        date: DateTime<Utc>,
        shift_time: ShiftTime,
    ) -> Self {
        Self {
            id,
            volunteer_id: Some(volunteer_id),
            job_type_name: job_type_name.into(),
            venue_name: venue_name.into(),
            date,
            shift_time,
            notes: String::new(),
            last_modified: date,
        }
    }

    /// Whether the job belongs to the given volunteer.
    pub fn is_for(&self, volunteer_id: VolunteerId) -> bool {
        self.volunteer_id == Some(volunteer_id)
    }

    /// Case-insensitive venue match.
    pub fn at_venue(&self, venue: &str) -> bool {
        self.venue_name.eq_ignore_ascii_case(venue)
    }
}

/// Fixed reward bundle attached directly to a job type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ManualRewards {
    /// How long the bundle stays valid, counted in service days
    pub duration_days: u32,
    pub free_drinks: u32,
    /// Bar discount, 0-100
    pub bar_discount_percentage: u8,
    pub free_entry: bool,
    pub invites: u32,
    #[serde(default)]
    pub other_notes: String,
}

impl Default for ManualRewards {
    fn default() -> Self {
        Self {
            duration_days: 1,
            free_drinks: 0,
            bar_discount_percentage: 0,
            free_entry: false,
            invites: 0,
            other_notes: String::new(),
        }
    }
}

impl ManualRewards {
    /// Human-readable summary listing only the components actually granted.
    ///
    /// Order is fixed: duration, drinks, discount, free entry, invites, notes.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.duration_days > 0 {
            parts.push(plural(self.duration_days, "day"));
        }
        if self.free_drinks > 0 {
            parts.push(plural(self.free_drinks, "free drink"));
        }
        if self.bar_discount_percentage > 0 {
            parts.push(format!("{}% bar discount", self.bar_discount_percentage));
        }
        if self.free_entry {
            parts.push("free entry".to_string());
        }
        if self.invites > 0 {
            parts.push(plural(self.invites, "invite"));
        }
        let notes = self.other_notes.trim();
        if !notes.is_empty() {
            parts.push(notes.to_string());
        }

        if parts.is_empty() {
            "Manual reward".to_string()
        } else {
            format!("Manual reward: {}", parts.join(", "))
        }
    }

    /// Check value ranges.
    pub fn validate(&self, job_type: &str) -> Result<()> {
        if self.bar_discount_percentage > 100 {
            return Err(RosterError::InvalidManualRewards {
                name: job_type.to_string(),
                reason: format!(
                    "bar discount {}% exceeds 100%",
                    self.bar_discount_percentage
                ),
            });
        }
        if self.duration_days > MAX_DURATION_DAYS {
            return Err(RosterError::InvalidManualRewards {
                name: job_type.to_string(),
                reason: format!(
                    "duration of {} days exceeds {MAX_DURATION_DAYS}",
                    self.duration_days
                ),
            });
        }
        Ok(())
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Which benefit system a job type uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BenefitSystem {
    /// Jobs feed the rank counters
    Tiered,
    /// Jobs grant a fixed bundle and never feed the rank counters
    Manual(ManualRewards),
}

impl BenefitSystem {
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual(_))
    }
}

/// Flat discriminant of [`BenefitSystem`], as found in raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenefitSystemType {
    /// Legacy records call the tiered system "stellar"
    #[serde(alias = "STELLAR")]
    Tiered,
    Manual,
}

/// Configuration of a job type, keyed by unique name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct JobTypeConfig {
    /// Unique name referenced by [`Job::job_type_name`]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Inactive types are ignored by every counter
    pub is_active: bool,
    /// Counts toward the shift tiers (Nova, Etoile, Galaxie)
    pub is_shift_job: bool,
    /// Counts toward the coordination track (Orion, Veteran)
    pub is_orion_job: bool,
    /// Whether the before/after-midnight distinction applies
    pub requires_shift_time: bool,
    pub benefit_system: BenefitSystem,
}

impl JobTypeConfig {
    /// A tiered shift job type requiring a shift time.
    pub fn shift(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            is_active: true,
            is_shift_job: true,
            is_orion_job: false,
            requires_shift_time: true,
            benefit_system: BenefitSystem::Tiered,
        }
    }

    /// A tiered coordination job type (committee roles and the like).
    pub fn coordination(name: impl Into<String>) -> Self {
        Self {
            is_shift_job: false,
            is_orion_job: true,
            requires_shift_time: false,
            ..Self::shift(name)
        }
    }

    /// A manual-system job type granting a fixed bundle.
    pub fn manual(name: impl Into<String>, rewards: ManualRewards) -> Self {
        Self {
            is_shift_job: false,
            requires_shift_time: false,
            benefit_system: BenefitSystem::Manual(rewards),
            ..Self::shift(name)
        }
    }

    /// Whether jobs of this type feed the shift counters.
    pub fn counts_as_shift(&self) -> bool {
        self.is_active && self.is_shift_job && !self.benefit_system.is_manual()
    }

    /// Whether jobs of this type feed the coordination counter.
    pub fn counts_as_coordination(&self) -> bool {
        self.is_active && self.is_orion_job && !self.benefit_system.is_manual()
    }

    /// The reward bundle if this active type uses the manual system.
    pub fn manual_rewards(&self) -> Option<&ManualRewards> {
        match &self.benefit_system {
            BenefitSystem::Manual(rewards) if self.is_active => Some(rewards),
            _ => None,
        }
    }

    /// Check the configuration at the entry boundary.
    pub fn validate(&self) -> Result<()> {
        if let BenefitSystem::Manual(rewards) = &self.benefit_system {
            rewards.validate(&self.name)?;
        }
        Ok(())
    }
}

/// Raw job-type record as delivered by storage or the sheet sync,
/// where the benefit system is a flag plus an optional payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTypeRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_shift_job: bool,
    #[serde(default)]
    pub is_orion_job: bool,
    #[serde(default = "default_true")]
    pub requires_shift_time: bool,
    pub benefit_system_type: BenefitSystemType,
    #[serde(default)]
    pub manual_rewards: Option<ManualRewards>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<JobTypeRecord> for JobTypeConfig {
    type Error = RosterError;

    fn try_from(record: JobTypeRecord) -> Result<Self> {
        let benefit_system = match (record.benefit_system_type, record.manual_rewards) {
            (BenefitSystemType::Tiered, _) => BenefitSystem::Tiered,
            (BenefitSystemType::Manual, Some(rewards)) => BenefitSystem::Manual(rewards),
            (BenefitSystemType::Manual, None) => {
                return Err(RosterError::MissingManualRewards(record.name));
            }
        };

        let config = Self {
            name: record.name,
            description: record.description,
            is_active: record.is_active,
            is_shift_job: record.is_shift_job,
            is_orion_job: record.is_orion_job,
            requires_shift_time: record.requires_shift_time,
            benefit_system,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Reward tiers.
///
/// Five earned tiers plus a manual `Special` override. Ordering follows
/// precedence: a higher tier is the primary rank when several qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolunteerRank {
    /// Shift before midnight this service month
    Nova = 1,
    /// Shift after midnight this service month
    Etoile = 2,
    /// Repeated shifts this service month
    Galaxie = 3,
    /// Coordination role within its tenure
    Orion = 4,
    /// The period following Orion tenure
    Veteran = 5,
    /// Manual override, bypasses counting
    Special = 6,
}

impl VolunteerRank {
    /// Get the precedence value (higher = preferred as primary rank)
    pub fn precedence(&self) -> u8 {
        *self as u8
    }

    /// Stable identifier for storage and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nova => "NOVA",
            Self::Etoile => "ETOILE",
            Self::Galaxie => "GALAXIE",
            Self::Orion => "ORION",
            Self::Veteran => "VETERAN",
            Self::Special => "SPECIAL",
        }
    }

    /// Name shown on badges
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nova => "Nova",
            Self::Etoile => "Étoile",
            Self::Galaxie => "Galaxie",
            Self::Orion => "Orion",
            Self::Veteran => "Veteran",
            Self::Special => "Special",
        }
    }

    /// Earned tiers in precedence order (highest first)
    pub fn earned_descending() -> [Self; 5] {
        [
            Self::Veteran,
            Self::Orion,
            Self::Galaxie,
            Self::Etoile,
            Self::Nova,
        ]
    }
}

/// A resolved perk package.
///
/// When `is_active` is false the perk fields are a record of what was
/// granted, never a current entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Benefit {
    pub is_active: bool,
    /// Last instant the benefit is valid; `None` when unbounded
    pub valid_until: Option<DateTime<Utc>>,
    pub description: String,
    pub free_entry: bool,
    pub friend_invitation: bool,
    pub invite_count: u32,
    pub drink_tokens: u32,
    /// Bar discount, 0-100
    pub bar_discount: u8,
    pub guest_list_access: bool,
    /// Reserved for the special tier and coordination track
    pub extraordinary_benefits: bool,
}

impl Benefit {
    /// An inactive benefit granting nothing.
    pub fn none(description: impl Into<String>) -> Self {
        Self {
            is_active: false,
            valid_until: None,
            description: description.into(),
            free_entry: false,
            friend_invitation: false,
            invite_count: 0,
            drink_tokens: 0,
            bar_discount: 0,
            guest_list_access: false,
            extraordinary_benefits: false,
        }
    }

    /// Whether the benefit is valid at `now`, re-derived from `valid_until`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(true, |until| now <= until)
    }

    /// Drink tokens currently owed (zero when inactive).
    pub fn owed_drinks(&self) -> u32 {
        if self.is_active {
            self.drink_tokens
        } else {
            0
        }
    }
}

/// The resolved read-model for one volunteer. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct VolunteerBenefitStatus {
    pub volunteer_id: VolunteerId,
    /// Current rank, or none
    pub rank: Option<VolunteerRank>,
    /// The package shown on badges and counted by dashboards
    pub benefits: Benefit,
    /// Every active tier benefit, highest precedence first
    pub active_benefits: Vec<Benefit>,
    pub last_job_date: Option<DateTime<Utc>>,
    /// Shift jobs inside the current service month
    pub monthly_shifts: u32,
    pub eligible_for_galaxie: bool,
    pub eligible_for_etoile: bool,
    pub eligible_for_nova: bool,
}
