//! Benefit resolution.
//!
//! Turns a rank assessment (or the most recent manual-reward job) into the
//! [`VolunteerBenefitStatus`] shown on badges and dashboards. Every deadline
//! is derived from job dates and policy; `now` only decides `is_active`.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace, warn};

use roster::{Benefit, Job, ManualRewards, Volunteer, VolunteerBenefitStatus, VolunteerRank};

use crate::clock::ServiceDayClock;
use crate::policy::{TierPolicy, Validity};
use crate::rank::RankEngine;
use crate::types::RankAssessment;

const NO_BENEFIT: &str = "No active benefit";

/// The most recent manual-reward job of a volunteer, resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualGrant {
    pub job_id: i64,
    pub job_date: DateTime<Utc>,
    pub benefit: Benefit,
}

/// Resolves benefit status for one engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct BenefitResolver<'a> {
    ranks: RankEngine<'a>,
}

impl<'a> BenefitResolver<'a> {
    pub fn new(ranks: RankEngine<'a>) -> Self {
        Self { ranks }
    }

    fn clock(&self) -> &'a ServiceDayClock {
        self.ranks.clock()
    }

    fn policy(&self) -> &'a TierPolicy {
        self.ranks.policy()
    }

    /// Resolve the current status of a volunteer.
    ///
    /// `jobs` may contain other volunteers' jobs; only those assigned to
    /// `volunteer` are considered.
    pub fn resolve<'j>(
        &self,
        volunteer: &Volunteer,
        jobs: impl IntoIterator<Item = &'j Job>,
        now: DateTime<Utc>,
    ) -> VolunteerBenefitStatus {
        let own: Vec<&Job> = jobs.into_iter().filter(|job| job.is_for(volunteer.id)).collect();
        let assessment = self.ranks.rank_for(volunteer, own.iter().copied(), now);
        self.resolve_with(volunteer, &assessment, own, now)
    }

    /// Resolve against an existing assessment of the same jobs.
    pub fn resolve_with<'j>(
        &self,
        volunteer: &Volunteer,
        assessment: &RankAssessment,
        jobs: impl IntoIterator<Item = &'j Job>,
        now: DateTime<Utc>,
    ) -> VolunteerBenefitStatus {
        let jobs: Vec<&Job> = jobs.into_iter().collect();
        let last_job_date = jobs
            .iter()
            .filter(|job| self.clock().start_of_service_day(job.date) <= now)
            .map(|job| job.date)
            .max();

        let tiered: Vec<Benefit> = assessment
            .qualifying
            .iter()
            .map(|rank| self.tier_benefit(*rank, assessment, now))
            .collect();
        let active_benefits: Vec<Benefit> = tiered.iter().filter(|b| b.is_active).cloned().collect();
        let manual = self.manual_grant(jobs.iter().copied(), now);

        let tally = &assessment.tally;
        let manual_is_latest = manual.as_ref().is_some_and(|grant| {
            grant.benefit.is_active && tally.last_qualifying().map_or(true, |last| grant.job_date >= last)
        });

        let (rank, benefits, active_benefits) = match manual {
            Some(grant) if manual_is_latest => {
                let active = vec![grant.benefit.clone()];
                (Some(VolunteerRank::Special), grant.benefit, active)
            }
            _ if !active_benefits.is_empty() => {
                let merged = merge_benefits(&active_benefits);
                (assessment.rank, merged, active_benefits)
            }
            // A manual bundle still running outlives an expired tier perk
            Some(grant) if grant.benefit.is_active => {
                let active = vec![grant.benefit.clone()];
                (Some(VolunteerRank::Special), grant.benefit, active)
            }
            _ if assessment.rank.is_some() => {
                // Record of the primary tier, nothing currently granted
                let record = tiered.first().cloned().unwrap_or_else(|| Benefit::none(NO_BENEFIT));
                (assessment.rank, record, Vec::new())
            }
            Some(grant) => (None, grant.benefit, Vec::new()),
            None => (None, Benefit::none(NO_BENEFIT), Vec::new()),
        };

        debug!(
            volunteer_id = volunteer.id,
            rank = ?rank,
            active = benefits.is_active,
            stacked = active_benefits.len(),
            "Resolved benefit status"
        );

        VolunteerBenefitStatus {
            volunteer_id: volunteer.id,
            rank,
            benefits,
            active_benefits,
            last_job_date,
            monthly_shifts: tally.shift_jobs,
            eligible_for_galaxie: self.ranks.galaxie_count(tally) >= self.policy().galaxie.min_jobs,
            eligible_for_etoile: tally.after_midnight >= self.policy().etoile.min_shifts,
            eligible_for_nova: tally.early_shifts() >= self.policy().nova.min_shifts,
        }
    }

    /// The most recent started job of an active manual-system type.
    pub fn manual_grant<'j>(
        &self,
        jobs: impl IntoIterator<Item = &'j Job>,
        now: DateTime<Utc>,
    ) -> Option<ManualGrant> {
        let mut latest: Option<(&Job, &ManualRewards)> = None;
        for job in jobs {
            let Some(config) = self.ranks.catalog().get(&job.job_type_name) else {
                continue;
            };
            let Some(rewards) = config.manual_rewards() else {
                if config.benefit_system.is_manual() {
                    trace!(job_id = job.id, job_type = %config.name, "Manual job type inactive");
                }
                continue;
            };
            if self.clock().start_of_service_day(job.date) > now {
                continue;
            }
            if latest.map_or(true, |(current, _)| job.date > current.date) {
                latest = Some((job, rewards));
            }
        }

        latest.map(|(job, rewards)| ManualGrant {
            job_id: job.id,
            job_date: job.date,
            benefit: self.manual_benefit(job.date, rewards, now),
        })
    }

    /// Instantiate a manual reward bundle earned by a job at `job_date`.
    ///
    /// Valid from the job's service day through the start of the service day
    /// `duration_days` later.
    pub fn manual_benefit(&self, job_date: DateTime<Utc>, rewards: &ManualRewards, now: DateTime<Utc>) -> Benefit {
        let day = self.clock().service_day(job_date);
        let valid_until = self.clock().day_start(day.plus_days(rewards.duration_days));
        Benefit {
            is_active: now <= valid_until,
            valid_until: Some(valid_until),
            description: rewards.describe(),
            free_entry: rewards.free_entry,
            friend_invitation: rewards.invites > 0,
            invite_count: rewards.invites,
            drink_tokens: rewards.free_drinks,
            bar_discount: rewards.bar_discount_percentage,
            guest_list_access: rewards.free_entry || rewards.invites > 0,
            extraordinary_benefits: false,
        }
    }

    /// The benefit a qualifying tier grants, with its deadline resolved.
    pub fn tier_benefit(&self, rank: VolunteerRank, assessment: &RankAssessment, now: DateTime<Utc>) -> Benefit {
        let template = self.policy().template(rank);
        let valid_until = match template.validity {
            Validity::Unbounded => None,
            validity => match self.deadline(rank, validity, assessment) {
                Some(until) => Some(until),
                None => {
                    warn!(rank = rank.as_str(), ?validity, "No anchor for tier deadline, benefit inactive");
                    let mut benefit = template.instantiate(None, now);
                    benefit.is_active = false;
                    return benefit;
                }
            },
        };
        template.instantiate(valid_until, now)
    }

    fn deadline(&self, rank: VolunteerRank, validity: Validity, assessment: &RankAssessment) -> Option<DateTime<Utc>> {
        let clock = self.clock();
        let last_instant = |end: DateTime<Utc>| end - Duration::milliseconds(1);

        if validity == Validity::TenureEnd {
            let tenure = assessment.tenure?;
            return match rank {
                VolunteerRank::Orion => Some(last_instant(tenure.orion_end)),
                VolunteerRank::Veteran => Some(last_instant(tenure.veteran_end)),
                _ => None,
            };
        }

        let tally = &assessment.tally;
        let anchor = match rank {
            VolunteerRank::Nova => tally.last_before_midnight,
            VolunteerRank::Etoile => tally.last_after_midnight,
            VolunteerRank::Galaxie if self.policy().galaxie.count_coordination_jobs => {
                tally.last_qualifying()
            }
            VolunteerRank::Galaxie => tally.last_shift,
            VolunteerRank::Orion | VolunteerRank::Veteran => tally.tenure_anchor,
            VolunteerRank::Special => None,
        }?;
        let day = clock.service_day(anchor);

        match validity {
            Validity::EndOfServiceDay => Some(clock.day_end(day)),
            Validity::DaysAfterServiceDay { days } => Some(clock.day_start(day.plus_days(days))),
            Validity::EndOfServiceMonth => Some(clock.service_month_window(anchor).last_instant()),
            Validity::TenureEnd | Validity::Unbounded => None,
        }
    }
}

/// Combine several active tier benefits into one package.
pub fn merge_benefits(benefits: &[Benefit]) -> Benefit {
    match benefits {
        [] => Benefit::none(NO_BENEFIT),
        [single] => single.clone(),
        _ => {
            let mut merged = Benefit::none(String::new());
            merged.is_active = benefits.iter().any(|b| b.is_active);
            merged.valid_until = if benefits.iter().any(|b| b.valid_until.is_none()) {
                None
            } else {
                benefits.iter().filter_map(|b| b.valid_until).max()
            };
            for benefit in benefits {
                merged.free_entry |= benefit.free_entry;
                merged.friend_invitation |= benefit.friend_invitation;
                merged.invite_count += benefit.invite_count;
                merged.drink_tokens += benefit.drink_tokens;
                merged.bar_discount = merged.bar_discount.max(benefit.bar_discount);
                merged.guest_list_access |= benefit.guest_list_access;
                merged.extraordinary_benefits |= benefit.extraordinary_benefits;
            }
            merged.description = describe_combined(&merged);
            merged
        }
    }
}

fn describe_combined(benefit: &Benefit) -> String {
    let mut parts = Vec::new();
    if benefit.free_entry {
        parts.push("Free entry".to_string());
    }
    if benefit.invite_count > 0 {
        parts.push(format!("{} invites", benefit.invite_count));
    }
    if benefit.drink_tokens > 0 {
        parts.push(format!("{} drink tokens", benefit.drink_tokens));
    }
    if benefit.bar_discount > 0 {
        parts.push(format!("{}% bar discount", benefit.bar_discount));
    }
    if benefit.guest_list_access {
        parts.push("Guest list access".to_string());
    }
    if benefit.extraordinary_benefits {
        parts.push("Extraordinary benefits".to_string());
    }

    if parts.is_empty() {
        "Combined benefits".to_string()
    } else {
        format!("Combined benefits: {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roster::{JobTypeCatalog, JobTypeConfig, ShiftTime};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn workshop_rewards() -> ManualRewards {
        ManualRewards {
            duration_days: 3,
            free_drinks: 2,
            bar_discount_percentage: 20,
            free_entry: true,
            invites: 1,
            other_notes: String::new(),
        }
    }

    fn catalog() -> JobTypeCatalog {
        let mut retired = JobTypeConfig::manual("Retired Workshop", workshop_rewards());
        retired.is_active = false;
        JobTypeCatalog::from_configs(vec![
            JobTypeConfig::shift("Bar Staff"),
            JobTypeConfig::coordination("Committee"),
            JobTypeConfig::manual("Workshop", workshop_rewards()),
            JobTypeConfig::manual(
                "Retreat",
                ManualRewards {
                    duration_days: 10,
                    free_drinks: 3,
                    ..Default::default()
                },
            ),
            retired,
        ])
        .unwrap()
    }

    fn make_job(id: i64, volunteer_id: i64, job_type: &str, date: DateTime<Utc>, shift_time: ShiftTime) -> Job {
        Job::new(id, volunteer_id, job_type, "Groove", date, shift_time)
    }

    fn with_resolver<T>(f: impl FnOnce(BenefitResolver<'_>) -> T) -> T {
        let catalog = catalog();
        let clock = ServiceDayClock::utc(3);
        let policy = TierPolicy::default();
        f(BenefitResolver::new(RankEngine::new(&catalog, &clock, &policy)))
    }

    #[test]
    fn test_no_jobs_inactive() {
        with_resolver(|resolver| {
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), std::iter::empty(), at(2025, 3, 15, 12));
            assert_eq!(status.rank, None);
            assert!(!status.benefits.is_active);
            assert_eq!(status.benefits.drink_tokens, 0);
            assert!(status.active_benefits.is_empty());
            assert_eq!(status.last_job_date, None);
        });
    }

    #[test]
    fn test_resolve_is_idempotent() {
        with_resolver(|resolver| {
            let jobs = vec![
                make_job(1, 1, "Bar Staff", at(2025, 3, 15, 21), ShiftTime::BeforeMidnight),
                make_job(2, 1, "Committee", at(2025, 3, 2, 19), ShiftTime::BeforeMidnight),
            ];
            let volunteer = Volunteer::new(1, "Alex");
            let now = at(2025, 3, 15, 22);
            assert_eq!(resolver.resolve(&volunteer, &jobs, now), resolver.resolve(&volunteer, &jobs, now));
        });
    }

    #[test]
    fn test_ignores_other_volunteers_jobs() {
        with_resolver(|resolver| {
            let jobs = vec![make_job(1, 2, "Bar Staff", at(2025, 3, 15, 21), ShiftTime::BeforeMidnight)];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 15, 22));
            assert_eq!(status.rank, None);
        });
    }

    #[test]
    fn test_nova_valid_until_end_of_service_day() {
        with_resolver(|resolver| {
            let jobs = vec![make_job(1, 1, "Bar Staff", at(2025, 3, 15, 21), ShiftTime::BeforeMidnight)];
            let volunteer = Volunteer::new(1, "Alex");

            let status = resolver.resolve(&volunteer, &jobs, at(2025, 3, 16, 2));
            assert_eq!(status.rank, Some(VolunteerRank::Nova));
            assert!(status.benefits.is_active);
            assert_eq!(status.benefits.drink_tokens, 2);
            assert_eq!(
                status.benefits.valid_until,
                Some(at(2025, 3, 16, 3) - Duration::milliseconds(1))
            );

            // Rank holds for the month, the perk does not
            let later = resolver.resolve(&volunteer, &jobs, at(2025, 3, 16, 3));
            assert_eq!(later.rank, Some(VolunteerRank::Nova));
            assert!(!later.benefits.is_active);
            assert!(later.active_benefits.is_empty());
            assert_eq!(later.benefits.owed_drinks(), 0);
        });
    }

    #[test]
    fn test_manual_benefit_matches_rewards() {
        with_resolver(|resolver| {
            let jobs = vec![make_job(1, 1, "Workshop", at(2025, 3, 10, 18), ShiftTime::BeforeMidnight)];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 11, 12));

            assert_eq!(status.rank, Some(VolunteerRank::Special));
            let benefit = &status.benefits;
            assert!(benefit.is_active);
            assert_eq!(benefit.drink_tokens, 2);
            assert_eq!(benefit.bar_discount, 20);
            assert!(benefit.free_entry);
            assert!(benefit.friend_invitation);
            assert_eq!(benefit.invite_count, 1);
            assert_eq!(benefit.description, workshop_rewards().describe());
            assert_eq!(status.monthly_shifts, 0);
        });
    }

    #[test]
    fn test_manual_expiry_window() {
        with_resolver(|resolver| {
            let volunteer = Volunteer::new(1, "Alex");
            let jobs = vec![make_job(1, 1, "Workshop", at(2025, 3, 10, 18), ShiftTime::BeforeMidnight)];
            let day_start = at(2025, 3, 10, 3);
            let until = day_start + Duration::days(3);

            for now in [day_start, at(2025, 3, 12, 12), until] {
                assert!(resolver.resolve(&volunteer, &jobs, now).benefits.is_active, "active at {now}");
            }
            let expired = resolver.resolve(&volunteer, &jobs, until + Duration::milliseconds(1));
            assert!(!expired.benefits.is_active);
            assert_eq!(expired.rank, None);
            assert_eq!(expired.benefits.valid_until, Some(until));
        });
    }

    #[test]
    fn test_inactive_manual_type_ignored() {
        with_resolver(|resolver| {
            let jobs = vec![make_job(1, 1, "Retired Workshop", at(2025, 3, 10, 18), ShiftTime::BeforeMidnight)];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 11, 12));
            assert_eq!(status.rank, None);
            assert!(!status.benefits.is_active);
        });
    }

    #[test]
    fn test_latest_of_manual_and_tiered_wins() {
        with_resolver(|resolver| {
            let volunteer = Volunteer::new(1, "Alex");
            let shift = make_job(1, 1, "Bar Staff", at(2025, 3, 10, 21), ShiftTime::BeforeMidnight);
            let workshop = make_job(2, 1, "Workshop", at(2025, 3, 11, 18), ShiftTime::BeforeMidnight);

            // Workshop is newer: manual bundle replaces the tier perk
            let jobs = vec![shift.clone(), workshop.clone()];
            let status = resolver.resolve(&volunteer, &jobs, at(2025, 3, 11, 20));
            assert_eq!(status.rank, Some(VolunteerRank::Special));
            assert_eq!(status.benefits.bar_discount, 20);

            // A newer shift brings the tier perk back
            let late_shift = make_job(3, 1, "Bar Staff", at(2025, 3, 12, 21), ShiftTime::BeforeMidnight);
            let jobs = vec![shift, workshop, late_shift];
            let status = resolver.resolve(&volunteer, &jobs, at(2025, 3, 12, 22));
            assert_eq!(status.rank, Some(VolunteerRank::Nova));
            assert_eq!(status.benefits.drink_tokens, 2);
        });
    }

    #[test]
    fn test_stacked_tiers_merge() {
        with_resolver(|resolver| {
            let jobs = vec![
                make_job(1, 1, "Bar Staff", at(2025, 3, 15, 21), ShiftTime::BeforeMidnight),
                make_job(2, 1, "Committee", at(2025, 3, 2, 19), ShiftTime::BeforeMidnight),
            ];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 15, 22));

            assert_eq!(status.rank, Some(VolunteerRank::Orion));
            assert_eq!(status.active_benefits.len(), 2);
            let merged = &status.benefits;
            assert!(merged.is_active);
            assert_eq!(merged.drink_tokens, 2);
            assert_eq!(merged.invite_count, 2);
            assert_eq!(merged.bar_discount, 50);
            assert!(merged.extraordinary_benefits);
            assert!(merged.description.starts_with("Combined benefits: "));
            // Orion tenure outlasts the Nova night
            assert_eq!(merged.valid_until, status.active_benefits[0].valid_until);
        });
    }

    #[test]
    fn test_special_override_is_unbounded() {
        with_resolver(|resolver| {
            let volunteer = Volunteer::new(1, "Alex").with_rank_override(VolunteerRank::Special);
            let status = resolver.resolve(&volunteer, std::iter::empty(), at(2025, 3, 15, 12));
            assert_eq!(status.rank, Some(VolunteerRank::Special));
            assert!(status.benefits.is_active);
            assert_eq!(status.benefits.valid_until, None);
            assert!(status.benefits.extraordinary_benefits);
        });
    }

    #[test]
    fn test_etoile_valid_for_31_days() {
        with_resolver(|resolver| {
            let jobs = vec![make_job(1, 1, "Bar Staff", at(2025, 3, 2, 1), ShiftTime::AfterMidnight)];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 20, 12));
            assert_eq!(status.rank, Some(VolunteerRank::Etoile));
            assert!(status.eligible_for_etoile);
            assert!(!status.eligible_for_nova);
            // Service day 1 March, plus 31 days
            assert_eq!(status.benefits.valid_until, Some(at(2025, 4, 1, 3)));
        });
    }

    #[test]
    fn test_running_manual_bundle_beats_expired_tier() {
        with_resolver(|resolver| {
            let jobs = vec![
                make_job(1, 1, "Retreat", at(2025, 3, 10, 18), ShiftTime::BeforeMidnight),
                make_job(2, 1, "Bar Staff", at(2025, 3, 12, 21), ShiftTime::BeforeMidnight),
            ];
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, at(2025, 3, 14, 12));

            assert_eq!(status.rank, Some(VolunteerRank::Special));
            assert!(status.benefits.is_active);
            assert_eq!(status.benefits.owed_drinks(), 3);
            assert_eq!(status.active_benefits.len(), 1);
            // The shift still shows in the counters
            assert_eq!(status.monthly_shifts, 1);
            assert!(status.eligible_for_nova);
        });
    }

    #[test]
    fn test_galaxie_valid_until_end_of_service_month() {
        with_resolver(|resolver| {
            let jobs: Vec<Job> = (1..=3)
                .map(|d| make_job(d, 1, "Bar Staff", at(2025, 3, d as u32 + 1, 21), ShiftTime::BeforeMidnight))
                .collect();
            let now = at(2025, 3, 15, 12);
            let status = resolver.resolve(&Volunteer::new(1, "Alex"), &jobs, now);

            assert_eq!(status.rank, Some(VolunteerRank::Galaxie));
            assert!(status.benefits.is_active);
            let window = resolver.clock().service_month_window(now);
            assert_eq!(status.benefits.valid_until, Some(window.last_instant()));
            assert_eq!(
                status.benefits.valid_until,
                Some(at(2025, 4, 1, 3) - Duration::milliseconds(1))
            );
        });
    }

    #[test]
    fn test_veteran_expires_at_tenure_end() {
        with_resolver(|resolver| {
            let committee = make_job(1, 1, "Committee", at(2024, 1, 10, 19), ShiftTime::BeforeMidnight);
            let veteran_end = resolver.ranks.tenure(committee.date).veteran_end;
            let jobs = vec![committee];
            let volunteer = Volunteer::new(1, "Alex");

            let last_moment = veteran_end - Duration::milliseconds(1);
            let status = resolver.resolve(&volunteer, &jobs, last_moment);
            assert_eq!(status.rank, Some(VolunteerRank::Veteran));
            assert!(status.benefits.is_active);
            assert_eq!(status.benefits.valid_until, Some(last_moment));

            let assessment = resolver.ranks.assess(&jobs, last_moment);
            let benefit = resolver.tier_benefit(VolunteerRank::Veteran, &assessment, veteran_end);
            assert!(!benefit.is_active);

            let after = resolver.resolve(&volunteer, &jobs, veteran_end);
            assert_eq!(after.rank, None);
            assert!(!after.benefits.is_active);
        });
    }

    #[test]
    fn test_rank_without_qualifying_tiers_is_inactive() {
        with_resolver(|resolver| {
            let now = at(2025, 3, 15, 12);
            let assessment = RankAssessment {
                rank: Some(VolunteerRank::Nova),
                qualifying: Vec::new(),
                tally: Default::default(),
                tenure: None,
                window: resolver.clock().service_month_window(now),
            };
            let status = resolver.resolve_with(&Volunteer::new(1, "Alex"), &assessment, std::iter::empty(), now);
            assert_eq!(status.rank, Some(VolunteerRank::Nova));
            assert!(!status.benefits.is_active);
            assert_eq!(status.benefits.owed_drinks(), 0);
        });
    }

    #[test]
    fn test_merge_single_is_unchanged() {
        let benefit = TierPolicy::default().nova.benefit.instantiate(None, at(2025, 3, 1, 0));
        assert_eq!(merge_benefits(std::slice::from_ref(&benefit)), benefit);
        assert!(!merge_benefits(&[]).is_active);
    }
}
