//! Volunteer rank and benefit engine.
//!
//! Turns job history, the job-type catalog and a service-day convention into
//! each volunteer's current rank, the benefit package it grants, and the
//! dashboard totals built from those packages.
//!
//! # Key Components
//!
//! - [`ServiceDayClock`]: venue-local service days with a configurable
//!   rollover hour, and the service-month window
//! - [`RankEngine`]: single-pass job classification and tier qualification
//! - [`BenefitResolver`]: tier templates or manual reward bundles, with
//!   deadlines derived from job dates
//! - [`AggregateReporter`]: free-drink totals and dashboard summaries over
//!   the same resolution path
//! - [`PerksEngine`]: validated configuration wiring the above together
//!
//! # Example
//!
//! ```ignore
//! use perks::{JobFilter, PerksConfig, PerksEngine};
//!
//! let (engine, snapshot) = PerksEngine::load(&roster, &PerksConfig::default()).await?;
//! let status = engine.status_for(&snapshot, volunteer_id, Utc::now());
//! let summary = engine.dashboard(&snapshot, &JobFilter::all(), Utc::now());
//! ```

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod engine;
pub mod policy;
pub mod rank;
pub mod resolver;
pub mod types;

// Re-export main types
pub use aggregate::{AggregateReporter, DashboardSummary, JobFilter, SeriesPoint};
pub use clock::{ServiceDay, ServiceDayClock, ServiceMonthWindow};
pub use config::PerksConfig;
pub use engine::PerksEngine;
pub use policy::{BenefitTemplate, TierPolicy, Validity};
pub use rank::RankEngine;
pub use resolver::{merge_benefits, BenefitResolver, ManualGrant};
pub use types::*;
