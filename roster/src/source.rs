//! Input providers for the perks engine.
//!
//! The engine never talks to storage. Callers pull one consistent
//! [`RosterSnapshot`] from a [`RosterSource`] and hand it to the engine,
//! which only reads it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Job, JobTypeConfig, Result, Volunteer, VolunteerId};

/// Trait for the storage/sync layer that owns volunteers, jobs and settings.
///
/// This is a clean abstraction over the persistence mechanism,
/// allowing for different implementations (database, sheet sync, memory).
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// All volunteers.
    async fn volunteers(&self) -> Result<Vec<Volunteer>>;

    /// All jobs, assigned or not.
    async fn all_jobs(&self) -> Result<Vec<Job>>;

    /// Jobs owned by one volunteer.
    async fn jobs_for_volunteer(&self, volunteer_id: VolunteerId) -> Result<Vec<Job>>;

    /// Jobs modified strictly after `since`, for incremental consumers.
    async fn jobs_modified_after(&self, since: DateTime<Utc>) -> Result<Vec<Job>>;

    /// Active job-type configurations.
    async fn job_type_configs(&self) -> Result<Vec<JobTypeConfig>>;

    /// The service-day offset setting.
    async fn offset_hours(&self) -> Result<i32>;
}

/// In-memory roster, for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryRoster {
    volunteers: Arc<RwLock<Vec<Volunteer>>>,
    jobs: Arc<RwLock<Vec<Job>>>,
    job_types: Arc<RwLock<Vec<JobTypeConfig>>>,
    offset_hours: Arc<RwLock<i32>>,
}

impl MemoryRoster {
    /// Create an empty roster with a midnight service-day boundary.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_volunteer(&self, volunteer: Volunteer) {
        self.volunteers.write().await.push(volunteer);
    }

    /// Insert or replace a job by id.
    pub async fn upsert_job(&self, job: Job) {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job,
            None => jobs.push(job),
        }
    }

    pub async fn add_job_type(&self, config: JobTypeConfig) {
        self.job_types.write().await.push(config);
    }

    pub async fn set_offset_hours(&self, hours: i32) {
        *self.offset_hours.write().await = hours;
    }
}

#[async_trait]
impl RosterSource for MemoryRoster {
    async fn volunteers(&self) -> Result<Vec<Volunteer>> {
        Ok(self.volunteers.read().await.clone())
    }

    async fn all_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.read().await.clone())
    }

    async fn jobs_for_volunteer(&self, volunteer_id: VolunteerId) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().filter(|j| j.is_for(volunteer_id)).cloned().collect())
    }

    async fn jobs_modified_after(&self, since: DateTime<Utc>) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .iter()
            .filter(|j| j.last_modified > since)
            .cloned()
            .collect())
    }

    async fn job_type_configs(&self) -> Result<Vec<JobTypeConfig>> {
        let job_types = self.job_types.read().await;
        Ok(job_types.iter().filter(|c| c.is_active).cloned().collect())
    }

    async fn offset_hours(&self) -> Result<i32> {
        Ok(*self.offset_hours.read().await)
    }
}

/// Immutable view of the roster, with jobs pre-indexed by volunteer.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub volunteers: Vec<Volunteer>,
    pub jobs: Vec<Job>,
    pub job_types: Vec<JobTypeConfig>,
    /// Raw setting; validated when the engine is built
    pub offset_hours: i32,
    by_volunteer: HashMap<VolunteerId, Vec<usize>>,
}

impl RosterSnapshot {
    /// Assemble a snapshot from already-loaded data.
    pub fn new(
        volunteers: Vec<Volunteer>,
        jobs: Vec<Job>,
        job_types: Vec<JobTypeConfig>,
        offset_hours: i32,
    ) -> Self {
        let mut by_volunteer: HashMap<VolunteerId, Vec<usize>> = HashMap::new();
        for (idx, job) in jobs.iter().enumerate() {
            if let Some(volunteer_id) = job.volunteer_id {
                by_volunteer.entry(volunteer_id).or_default().push(idx);
            }
        }

        Self {
            volunteers,
            jobs,
            job_types,
            offset_hours,
            by_volunteer,
        }
    }

    /// Pull every collection from the source.
    pub async fn load(source: &dyn RosterSource) -> Result<Self> {
        let volunteers = source.volunteers().await?;
        let jobs = source.all_jobs().await?;
        let job_types = source.job_type_configs().await?;
        let offset_hours = source.offset_hours().await?;

        tracing::info!(
            volunteers = volunteers.len(),
            jobs = jobs.len(),
            job_types = job_types.len(),
            offset_hours,
            "Loaded roster snapshot"
        );

        Ok(Self::new(volunteers, jobs, job_types, offset_hours))
    }

    /// Jobs owned by one volunteer.
    pub fn jobs_for(&self, volunteer_id: VolunteerId) -> impl Iterator<Item = &Job> + '_ {
        self.by_volunteer
            .get(&volunteer_id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.jobs[idx])
    }

    pub fn volunteer(&self, volunteer_id: VolunteerId) -> Option<&Volunteer> {
        self.volunteers.iter().find(|v| v.id == volunteer_id)
    }

    /// Jobs with no owning volunteer.
    pub fn unassigned_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|j| j.volunteer_id.is_none())
    }
}
