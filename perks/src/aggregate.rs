//! Cross-volunteer totals for dashboard cards.
//!
//! Every total goes through [`BenefitResolver::resolve`], the same path
//! as a single volunteer's detail panel.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use roster::{Job, Volunteer, VolunteerBenefitStatus, VolunteerId, VolunteerRank};

use crate::resolver::BenefitResolver;

/// Restricts which jobs the reporter sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// Venue name, matched case-insensitively
    pub venue: Option<String>,
}

impl JobFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn venue(venue: impl Into<String>) -> Self {
        Self {
            venue: Some(venue.into()),
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.venue.as_deref().map_or(true, |venue| job.at_venue(venue))
    }
}

/// Totals shown on the dashboard summary cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Drink tokens owed by active benefits
    pub free_drinks: u32,
    /// Volunteers whose active benefit grants guest-list access
    pub guest_list_volunteers: u32,
    /// Invites granted by active benefits
    pub total_invites: u32,
    /// Active volunteers per current rank
    pub rank_counts: BTreeMap<VolunteerRank, u32>,
    /// Volunteers with a currently active benefit
    pub with_active_benefit: u32,
    pub active_volunteers: u32,
    pub inactive_volunteers: u32,
}

/// One point of a free-drink time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub at: DateTime<Utc>,
    pub free_drinks: u32,
}

/// Population-level reductions over volunteer benefit status.
#[derive(Debug, Clone, Copy)]
pub struct AggregateReporter<'a> {
    resolver: BenefitResolver<'a>,
}

impl<'a> AggregateReporter<'a> {
    pub fn new(resolver: BenefitResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Resolved status of every active volunteer.
    pub fn statuses(
        &self,
        volunteers: &[Volunteer],
        jobs: &[Job],
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> Vec<VolunteerBenefitStatus> {
        let index = index_jobs(jobs, filter);
        volunteers
            .iter()
            .filter(|volunteer| volunteer.is_active)
            .map(|volunteer| self.resolve_indexed(volunteer, &index, now))
            .collect()
    }

    /// Drink tokens owed right now across all active volunteers.
    pub fn total_free_drinks(&self, volunteers: &[Volunteer], jobs: &[Job], now: DateTime<Utc>) -> u32 {
        self.total_free_drinks_filtered(volunteers, jobs, &JobFilter::all(), now)
    }

    pub fn total_free_drinks_filtered(
        &self,
        volunteers: &[Volunteer],
        jobs: &[Job],
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> u32 {
        self.statuses(volunteers, jobs, filter, now)
            .iter()
            .map(|status| status.benefits.owed_drinks())
            .sum()
    }

    /// Dashboard summary at `now`.
    pub fn summary(
        &self,
        volunteers: &[Volunteer],
        jobs: &[Job],
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> DashboardSummary {
        let index = index_jobs(jobs, filter);
        let mut summary = DashboardSummary::default();

        for volunteer in volunteers {
            if !volunteer.is_active {
                summary.inactive_volunteers += 1;
                continue;
            }
            summary.active_volunteers += 1;

            let status = self.resolve_indexed(volunteer, &index, now);
            if let Some(rank) = status.rank {
                *summary.rank_counts.entry(rank).or_default() += 1;
            }
            let benefit = &status.benefits;
            if benefit.is_active {
                summary.with_active_benefit += 1;
                summary.free_drinks += benefit.drink_tokens;
                summary.total_invites += benefit.invite_count;
                if benefit.guest_list_access {
                    summary.guest_list_volunteers += 1;
                }
            }
        }

        debug!(
            active = summary.active_volunteers,
            free_drinks = summary.free_drinks,
            venue = ?filter.venue,
            "Computed dashboard summary"
        );
        summary
    }

    /// Free-drink totals from `from` to `to` inclusive, every `step`.
    ///
    /// Each point only sees jobs dated up to that point.
    pub fn free_drinks_series(
        &self,
        volunteers: &[Volunteer],
        jobs: &[Job],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        step: Duration,
    ) -> Vec<SeriesPoint> {
        if step <= Duration::zero() {
            warn!(?step, "Non-positive series step, returning no points");
            return Vec::new();
        }

        let mut points = Vec::new();
        let mut at = from;
        while at <= to {
            let seen: Vec<Job> = jobs.iter().filter(|job| job.date <= at).cloned().collect();
            points.push(SeriesPoint {
                at,
                free_drinks: self.total_free_drinks(volunteers, &seen, at),
            });
            match at.checked_add_signed(step) {
                Some(next) => at = next,
                None => break,
            }
        }
        points
    }

    fn resolve_indexed(
        &self,
        volunteer: &Volunteer,
        index: &HashMap<VolunteerId, Vec<&Job>>,
        now: DateTime<Utc>,
    ) -> VolunteerBenefitStatus {
        let jobs = index.get(&volunteer.id).map(Vec::as_slice).unwrap_or_default();
        self.resolver.resolve(volunteer, jobs.iter().copied(), now)
    }
}

fn index_jobs<'j>(jobs: &'j [Job], filter: &JobFilter) -> HashMap<VolunteerId, Vec<&'j Job>> {
    let mut index: HashMap<VolunteerId, Vec<&Job>> = HashMap::new();
    for job in jobs.iter().filter(|job| filter.matches(job)) {
        if let Some(volunteer_id) = job.volunteer_id {
            index.entry(volunteer_id).or_default().push(job);
        }
    }
    index
}
