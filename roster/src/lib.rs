//! Volunteer roster data model.
//!
//! This crate holds the inputs and outputs of the perks engine:
//!
//! - **Volunteers** and the **jobs** they performed at venues
//! - **Job-type configurations**, each selecting either the tiered rank
//!   system or a fixed manual reward bundle ([`BenefitSystem`])
//! - **Ranks**, **benefits** and the per-volunteer [`VolunteerBenefitStatus`]
//!
//! # Key Components
//!
//! - [`JobTypeCatalog`]: name-keyed lookup of job-type configurations
//! - [`RosterSource`]: trait for the storage/sync layer feeding the engine
//! - [`RosterSnapshot`]: consistent, pre-indexed view handed to the engine
//! - [`activity`]: derives the `is_active` flag from job history
//!
//! # Example
//!
//! ```ignore
//! use roster::{MemoryRoster, RosterSnapshot};
//!
//! let roster = MemoryRoster::new();
//! let snapshot = RosterSnapshot::load(&roster).await?;
//! for job in snapshot.jobs_for(volunteer_id) { /* ... */ }
//! ```

pub mod activity;
pub mod catalog;
pub mod source;
pub mod types;

// Re-export main types
pub use catalog::JobTypeCatalog;
pub use source::{MemoryRoster, RosterSnapshot, RosterSource};
pub use types::*;
