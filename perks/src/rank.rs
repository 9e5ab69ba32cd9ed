//! Rank computation from job history.
//!
//! Jobs are classified in a single pass against the job-type catalog:
//! shift jobs (split by shift time) and coordination jobs are counted inside
//! the current service month, and the latest coordination job anchors the
//! Orion/Veteran tenure track. Jobs whose service day has not started yet
//! are ignored.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use roster::{Job, JobTypeCatalog, ShiftTime, Volunteer, VolunteerRank};

use crate::clock::ServiceDayClock;
use crate::policy::TierPolicy;
use crate::types::{RankAssessment, RankTally, Tenure};

/// Computes ranks for one catalog, clock and policy.
#[derive(Debug, Clone, Copy)]
pub struct RankEngine<'a> {
    catalog: &'a JobTypeCatalog,
    clock: &'a ServiceDayClock,
    policy: &'a TierPolicy,
}

impl<'a> RankEngine<'a> {
    pub fn new(catalog: &'a JobTypeCatalog, clock: &'a ServiceDayClock, policy: &'a TierPolicy) -> Self {
        Self {
            catalog,
            clock,
            policy,
        }
    }

    pub fn catalog(&self) -> &'a JobTypeCatalog {
        self.catalog
    }

    pub fn clock(&self) -> &'a ServiceDayClock {
        self.clock
    }

    pub fn policy(&self) -> &'a TierPolicy {
        self.policy
    }

    /// Current rank for a set of jobs, or none without qualifying activity.
    pub fn compute_rank<'j>(
        &self,
        jobs: impl IntoIterator<Item = &'j Job>,
        now: DateTime<Utc>,
    ) -> Option<VolunteerRank> {
        self.assess(jobs, now).rank
    }

    /// Rank for a volunteer, honouring the manual `Special` override.
    pub fn rank_for<'j>(
        &self,
        volunteer: &Volunteer,
        jobs: impl IntoIterator<Item = &'j Job>,
        now: DateTime<Utc>,
    ) -> RankAssessment {
        let mut assessment = self.assess(jobs, now);
        if volunteer.has_special_override() {
            debug!(volunteer_id = volunteer.id, "Special override replaces earned ranks");
            assessment.rank = Some(VolunteerRank::Special);
            assessment.qualifying = vec![VolunteerRank::Special];
        }
        assessment
    }

    /// Count qualifying jobs and derive every qualifying rank.
    pub fn assess<'j>(&self, jobs: impl IntoIterator<Item = &'j Job>, now: DateTime<Utc>) -> RankAssessment {
        let window = self.clock.service_month_window(now);
        let mut tally = RankTally::default();

        for job in jobs {
            let Some(config) = self.catalog.get(&job.job_type_name) else {
                // Sources only deliver active job types
                trace!(job_id = job.id, job_type = %job.job_type_name, "Job type not in catalog, ignoring job");
                continue;
            };
            if !config.counts_as_shift() && !config.counts_as_coordination() {
                trace!(job_id = job.id, job_type = %config.name, "Job type does not feed rank counters");
                continue;
            }
            if self.clock.start_of_service_day(job.date) > now {
                trace!(job_id = job.id, "Job service day not started yet");
                continue;
            }

            if config.counts_as_coordination() {
                tally.tenure_anchor = tally.tenure_anchor.max(Some(job.date));
            }
            if !window.contains(job.date) {
                continue;
            }

            if config.counts_as_shift() {
                tally.shift_jobs += 1;
                tally.last_shift = tally.last_shift.max(Some(job.date));
                if !config.requires_shift_time {
                    tally.untimed += 1;
                    tally.last_before_midnight = tally.last_before_midnight.max(Some(job.date));
                } else {
                    match job.shift_time {
                        ShiftTime::BeforeMidnight => {
                            tally.before_midnight += 1;
                            tally.last_before_midnight =
                                tally.last_before_midnight.max(Some(job.date));
                        }
                        ShiftTime::AfterMidnight => {
                            tally.after_midnight += 1;
                            tally.last_after_midnight = tally.last_after_midnight.max(Some(job.date));
                        }
                    }
                }
            }
            if config.counts_as_coordination() {
                tally.coordination_jobs += 1;
                tally.last_coordination = tally.last_coordination.max(Some(job.date));
            }
        }

        let tenure = tally.tenure_anchor.map(|anchor| self.tenure(anchor));
        let qualifying: Vec<VolunteerRank> = VolunteerRank::earned_descending()
            .into_iter()
            .filter(|rank| self.qualifies(*rank, &tally, tenure.as_ref(), now))
            .collect();

        RankAssessment {
            rank: qualifying.first().copied(),
            qualifying,
            tally,
            tenure,
            window,
        }
    }

    /// Tenure periods anchored on a coordination job. Ends past the
    /// representable range saturate.
    pub fn tenure(&self, anchor: DateTime<Utc>) -> Tenure {
        let after = |from: DateTime<Utc>, days: u32| {
            from.checked_add_signed(Duration::days(i64::from(days)))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };
        let start = self.clock.start_of_service_day(anchor);
        let orion_end = after(start, self.policy.orion.tenure_days);
        let veteran_end = after(orion_end, self.policy.veteran.tenure_days);
        Tenure {
            start,
            orion_end,
            veteran_end,
        }
    }

    /// Number of jobs the Galaxie threshold is measured against.
    pub fn galaxie_count(&self, tally: &RankTally) -> u32 {
        if self.policy.galaxie.count_coordination_jobs {
            tally.shift_jobs + tally.coordination_jobs
        } else {
            tally.shift_jobs
        }
    }

    fn qualifies(
        &self,
        rank: VolunteerRank,
        tally: &RankTally,
        tenure: Option<&Tenure>,
        now: DateTime<Utc>,
    ) -> bool {
        match rank {
            VolunteerRank::Veteran => {
                tenure.is_some_and(|t| now >= t.orion_end && now < t.veteran_end)
            }
            VolunteerRank::Orion => tenure.is_some_and(|t| now >= t.start && now < t.orion_end),
            VolunteerRank::Galaxie => self.galaxie_count(tally) >= self.policy.galaxie.min_jobs,
            VolunteerRank::Etoile => tally.after_midnight >= self.policy.etoile.min_shifts,
            VolunteerRank::Nova => tally.early_shifts() >= self.policy.nova.min_shifts,
            VolunteerRank::Special => false,
        }
    }
}
