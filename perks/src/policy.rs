//! Tier thresholds and benefit templates.
//!
//! All of this is organization policy, carried as data so it can be changed
//! through configuration. The defaults reproduce the rules the organization
//! ships with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roster::{Benefit, VolunteerRank, MAX_DURATION_DAYS};

use crate::types::{PerksError, Result};

/// How long a tier benefit stays valid, relative to the job that earned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validity {
    /// Until the end of the service day of the earning job
    EndOfServiceDay,
    /// Until the start of the service day `days` after the earning job
    DaysAfterServiceDay { days: u32 },
    /// Until the end of the service month of the earning job
    EndOfServiceMonth,
    /// Until the end of the coordination tenure period
    TenureEnd,
    /// No expiry
    Unbounded,
}

/// Perk values granted by a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitTemplate {
    pub description: String,
    #[serde(default)]
    pub free_entry: bool,
    #[serde(default)]
    pub friend_invitation: bool,
    #[serde(default)]
    pub invite_count: u32,
    #[serde(default)]
    pub drink_tokens: u32,
    #[serde(default)]
    pub bar_discount: u8,
    #[serde(default)]
    pub guest_list_access: bool,
    #[serde(default)]
    pub extraordinary_benefits: bool,
    pub validity: Validity,
}

impl BenefitTemplate {
    /// Instantiate the template with a resolved deadline.
    pub fn instantiate(&self, valid_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Benefit {
        Benefit {
            is_active: valid_until.map_or(true, |until| now <= until),
            valid_until,
            description: self.description.clone(),
            free_entry: self.free_entry,
            friend_invitation: self.friend_invitation,
            invite_count: self.invite_count,
            drink_tokens: self.drink_tokens,
            bar_discount: self.bar_discount,
            guest_list_access: self.guest_list_access,
            extraordinary_benefits: self.extraordinary_benefits,
        }
    }
}

/// A tier earned by a minimum number of shifts in the service month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTier {
    pub min_shifts: u32,
    pub benefit: BenefitTemplate,
}

/// A tier earned by volume of jobs in the service month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTier {
    pub min_jobs: u32,
    /// Whether coordination jobs add to the shift count
    #[serde(default)]
    pub count_coordination_jobs: bool,
    pub benefit: BenefitTemplate,
}

/// A tier held for a fixed period on the coordination track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenureTier {
    pub tenure_days: u32,
    pub benefit: BenefitTemplate,
}

/// The manual override tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTier {
    pub benefit: BenefitTemplate,
}

/// Complete tier policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Before-midnight shifts (or shifts of untimed job types)
    pub nova: ShiftTier,
    /// After-midnight shifts
    pub etoile: ShiftTier,
    pub galaxie: MonthlyTier,
    /// Measured from the service day of the latest coordination job
    pub orion: TenureTier,
    /// Follows directly after Orion tenure
    pub veteran: TenureTier,
    pub special: SpecialTier,
}

impl Default for TierPolicy {
    fn default() -> Self {
        let coordination_perks = |description: &str| BenefitTemplate {
            description: description.to_string(),
            free_entry: true,
            friend_invitation: true,
            invite_count: 1,
            drink_tokens: 0,
            bar_discount: 50,
            guest_list_access: true,
            extraordinary_benefits: true,
            validity: Validity::TenureEnd,
        };

        Self {
            nova: ShiftTier {
                min_shifts: 1,
                benefit: BenefitTemplate {
                    description: "Free entry + 1 guest for the same-night event; 2 drink tokens; 50% bar discount (same night)".to_string(),
                    free_entry: true,
                    friend_invitation: true,
                    invite_count: 1,
                    drink_tokens: 2,
                    bar_discount: 50,
                    guest_list_access: true,
                    extraordinary_benefits: false,
                    validity: Validity::EndOfServiceDay,
                },
            },
            etoile: ShiftTier {
                min_shifts: 1,
                benefit: BenefitTemplate {
                    description: "Free entry (same night); plus within 31 days: free entry + 1 guest for another event".to_string(),
                    free_entry: true,
                    friend_invitation: true,
                    invite_count: 1,
                    drink_tokens: 0,
                    bar_discount: 0,
                    guest_list_access: true,
                    extraordinary_benefits: false,
                    validity: Validity::DaysAfterServiceDay { days: 31 },
                },
            },
            galaxie: MonthlyTier {
                min_jobs: 3,
                count_coordination_jobs: false,
                benefit: BenefitTemplate {
                    description: "Free entry + 50% bar discount for all events this month".to_string(),
                    free_entry: true,
                    friend_invitation: false,
                    invite_count: 0,
                    drink_tokens: 0,
                    bar_discount: 50,
                    guest_list_access: true,
                    extraordinary_benefits: false,
                    validity: Validity::EndOfServiceMonth,
                },
            },
            orion: TenureTier {
                tenure_days: 365,
                benefit: coordination_perks(
                    "1 guest per event; 50% bar discount; partner benefits (1 year from Orion start)",
                ),
            },
            veteran: TenureTier {
                tenure_days: 365,
                benefit: coordination_perks(
                    "1 guest per event; 50% bar discount; partner benefits (1 year after Orion)",
                ),
            },
            special: SpecialTier {
                benefit: BenefitTemplate {
                    description: "Special rank: extraordinary benefits".to_string(),
                    free_entry: true,
                    friend_invitation: false,
                    invite_count: 0,
                    drink_tokens: 0,
                    bar_discount: 0,
                    guest_list_access: true,
                    extraordinary_benefits: true,
                    validity: Validity::Unbounded,
                },
            },
        }
    }
}

impl TierPolicy {
    /// Benefit template for a rank.
    pub fn template(&self, rank: VolunteerRank) -> &BenefitTemplate {
        match rank {
            VolunteerRank::Nova => &self.nova.benefit,
            VolunteerRank::Etoile => &self.etoile.benefit,
            VolunteerRank::Galaxie => &self.galaxie.benefit,
            VolunteerRank::Orion => &self.orion.benefit,
            VolunteerRank::Veteran => &self.veteran.benefit,
            VolunteerRank::Special => &self.special.benefit,
        }
    }

    /// Check thresholds and templates.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("nova.min_shifts", self.nova.min_shifts),
            ("etoile.min_shifts", self.etoile.min_shifts),
            ("galaxie.min_jobs", self.galaxie.min_jobs),
            ("orion.tenure_days", self.orion.tenure_days),
            ("veteran.tenure_days", self.veteran.tenure_days),
        ];
        for (field, value) in thresholds {
            if value == 0 {
                return Err(PerksError::InvalidPolicy(format!("{field} must be positive")));
            }
        }
        for (field, days) in [
            ("orion.tenure_days", self.orion.tenure_days),
            ("veteran.tenure_days", self.veteran.tenure_days),
        ] {
            if days > MAX_DURATION_DAYS {
                return Err(PerksError::InvalidPolicy(format!(
                    "{field} exceeds {MAX_DURATION_DAYS} days"
                )));
            }
        }

        for rank in VolunteerRank::earned_descending()
            .into_iter()
            .chain([VolunteerRank::Special])
        {
            let template = self.template(rank);
            if template.bar_discount > 100 {
                return Err(PerksError::InvalidPolicy(format!(
                    "{} bar discount {}% exceeds 100%",
                    rank.as_str(),
                    template.bar_discount
                )));
            }
            if let Validity::DaysAfterServiceDay { days } = template.validity {
                if days == 0 || days > MAX_DURATION_DAYS {
                    return Err(PerksError::InvalidPolicy(format!(
                        "{} validity of {days} days outside 1..={MAX_DURATION_DAYS}",
                        rank.as_str()
                    )));
                }
            }
        }
        Ok(())
    }
}
