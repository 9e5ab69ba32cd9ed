//! Engine facade.
//!
//! [`PerksEngine`] owns the validated clock, tier policy and job-type catalog,
//! and hands out borrowed views for rank computation, benefit resolution and
//! aggregates. It holds no other state; every call is a pure function of its
//! arguments.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use roster::{
    JobTypeCatalog, RosterSnapshot, RosterSource, VolunteerBenefitStatus, VolunteerId,
};

use crate::aggregate::{AggregateReporter, DashboardSummary, JobFilter};
use crate::clock::ServiceDayClock;
use crate::config::PerksConfig;
use crate::policy::TierPolicy;
use crate::rank::RankEngine;
use crate::resolver::BenefitResolver;
use crate::types::Result;

/// Validated engine configuration.
#[derive(Debug, Clone)]
pub struct PerksEngine {
    clock: ServiceDayClock,
    policy: TierPolicy,
    catalog: JobTypeCatalog,
}

impl PerksEngine {
    /// Build an engine, validating the configuration.
    pub fn new(config: &PerksConfig, catalog: JobTypeCatalog) -> Result<Self> {
        config.validate()?;
        let clock = config.clock()?;
        info!(
            offset_hours = clock.offset_hours(),
            timezone = %clock.timezone(),
            job_types = catalog.len(),
            "Perks engine configured"
        );
        Ok(Self {
            clock,
            policy: config.policy.clone(),
            catalog,
        })
    }

    /// Build an engine for a snapshot, taking the offset and job types from it.
    pub fn for_snapshot(config: &PerksConfig, snapshot: &RosterSnapshot) -> Result<Self> {
        let config = config.clone().with_offset_hours(snapshot.offset_hours)?;
        let catalog = JobTypeCatalog::from_configs(snapshot.job_types.iter().cloned())?;
        Self::new(&config, catalog)
    }

    /// Load a snapshot from a source and build an engine for it.
    pub async fn load(
        source: &dyn RosterSource,
        config: &PerksConfig,
    ) -> Result<(Self, RosterSnapshot)> {
        let snapshot = RosterSnapshot::load(source).await?;
        let engine = Self::for_snapshot(config, &snapshot)?;
        Ok((engine, snapshot))
    }

    pub fn clock(&self) -> &ServiceDayClock {
        &self.clock
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &JobTypeCatalog {
        &self.catalog
    }

    pub fn ranks(&self) -> RankEngine<'_> {
        RankEngine::new(&self.catalog, &self.clock, &self.policy)
    }

    pub fn resolver(&self) -> BenefitResolver<'_> {
        BenefitResolver::new(self.ranks())
    }

    pub fn reporter(&self) -> AggregateReporter<'_> {
        AggregateReporter::new(self.resolver())
    }

    /// Status of one volunteer in a snapshot, or `None` if unknown.
    pub fn status_for(
        &self,
        snapshot: &RosterSnapshot,
        volunteer_id: VolunteerId,
        now: DateTime<Utc>,
    ) -> Option<VolunteerBenefitStatus> {
        let Some(volunteer) = snapshot.volunteer(volunteer_id) else {
            debug!(volunteer_id, "Volunteer not in snapshot");
            return None;
        };
        Some(self.resolver().resolve(volunteer, snapshot.jobs_for(volunteer_id), now))
    }

    /// Dashboard summary over a snapshot.
    pub fn dashboard(
        &self,
        snapshot: &RosterSnapshot,
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> DashboardSummary {
        self.reporter()
            .summary(&snapshot.volunteers, &snapshot.jobs, filter, now)
    }
}
