//! Volunteer activity tracking.
//!
//! A volunteer is active while their most recent job is less than a year old,
//! and becomes a cleanup candidate after four years without a job. The engine
//! only reads the resulting `is_active` flag.

use chrono::{DateTime, Months, Utc};

use crate::types::{Job, Volunteer};

/// Years without a job before a volunteer counts as inactive.
pub const ACTIVE_THRESHOLD_YEARS: u32 = 1;

/// Years without a job before a volunteer is proposed for cleanup.
pub const CLEANUP_THRESHOLD_YEARS: u32 = 4;

fn years_before(now: DateTime<Utc>, years: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(years * 12))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whether a last-shift date keeps the volunteer active at `now`.
pub fn is_active_since(last_shift_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_shift_date.is_some_and(|last| last >= years_before(now, ACTIVE_THRESHOLD_YEARS))
}

/// Whether the volunteer has been idle long enough to be removed.
pub fn should_cleanup(volunteer: &Volunteer, now: DateTime<Utc>) -> bool {
    volunteer
        .last_shift_date
        .is_some_and(|last| last < years_before(now, CLEANUP_THRESHOLD_YEARS))
}

/// Whole days since the last job, if any.
pub fn days_since_last_shift(volunteer: &Volunteer, now: DateTime<Utc>) -> Option<i64> {
    volunteer.last_shift_date.map(|last| (now - last).num_days())
}

/// Short activity label for list rows.
pub fn activity_label(volunteer: &Volunteer, now: DateTime<Utc>) -> String {
    match days_since_last_shift(volunteer, now) {
        None => "Never worked".to_string(),
        Some(0) => "Active (today)".to_string(),
        Some(days) if days < 30 => format!("Active ({days} days ago)"),
        Some(days) if days < 365 => format!("Active ({} months ago)", days / 30),
        Some(days) => format!("Inactive ({} years ago)", days / 365),
    }
}

/// Recompute `last_shift_date` and `is_active` from the volunteer's jobs.
pub fn refresh_from_jobs<'a>(
    volunteer: &Volunteer,
    jobs: impl IntoIterator<Item = &'a Job>,
    now: DateTime<Utc>,
) -> Volunteer {
    let last_shift_date = jobs
        .into_iter()
        .filter(|job| job.is_for(volunteer.id))
        .map(|job| job.date)
        .max();

    Volunteer {
        last_shift_date,
        is_active: is_active_since(last_shift_date, now),
        ..volunteer.clone()
    }
}

/// Refresh every volunteer against the full job list.
pub fn refresh_all(volunteers: &[Volunteer], jobs: &[Job], now: DateTime<Utc>) -> Vec<Volunteer> {
    volunteers
        .iter()
        .map(|v| refresh_from_jobs(v, jobs, now))
        .collect()
}
