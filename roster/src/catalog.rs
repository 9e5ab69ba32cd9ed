//! Read-only catalog of job-type configurations, keyed by name.

use std::collections::HashMap;

use crate::types::{JobTypeConfig, JobTypeRecord, Result, RosterError};

/// Lookup from job-type name to its configuration.
#[derive(Debug, Clone, Default)]
pub struct JobTypeCatalog {
    by_name: HashMap<String, JobTypeConfig>,
}

impl JobTypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate names and invalid reward bundles.
    pub fn from_configs(configs: impl IntoIterator<Item = JobTypeConfig>) -> Result<Self> {
        let mut by_name = HashMap::new();
        for config in configs {
            config.validate()?;
            if by_name.contains_key(&config.name) {
                return Err(RosterError::DuplicateJobType(config.name));
            }
            by_name.insert(config.name.clone(), config);
        }

        tracing::info!(job_types = by_name.len(), "Loaded job type catalog");
        Ok(Self { by_name })
    }

    /// Build a catalog from raw records, converting the flat benefit flag
    /// into [`crate::BenefitSystem`].
    pub fn from_records(records: impl IntoIterator<Item = JobTypeRecord>) -> Result<Self> {
        let configs = records
            .into_iter()
            .map(JobTypeConfig::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::from_configs(configs)
    }

    /// Build a catalog, skipping entries that fail validation.
    ///
    /// The first configuration wins on duplicate names.
    pub fn from_records_lenient(records: impl IntoIterator<Item = JobTypeRecord>) -> Self {
        let mut by_name = HashMap::new();
        for record in records {
            let name = record.name.clone();
            match JobTypeConfig::try_from(record) {
                Ok(config) if by_name.contains_key(&config.name) => {
                    tracing::warn!(job_type = %name, "Skipping duplicate job type");
                }
                Ok(config) => {
                    by_name.insert(config.name.clone(), config);
                }
                Err(e) => {
                    tracing::warn!(job_type = %name, error = %e, "Skipping invalid job type");
                }
            }
        }
        Self { by_name }
    }

    /// Get a configuration by name.
    pub fn get(&self, name: &str) -> Option<&JobTypeConfig> {
        self.by_name.get(name)
    }

    /// Active configurations only.
    pub fn active(&self) -> impl Iterator<Item = &JobTypeConfig> {
        self.by_name.values().filter(|c| c.is_active)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobTypeConfig> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BenefitSystemType, ManualRewards};

    fn record(name: &str, system: BenefitSystemType, rewards: Option<ManualRewards>) -> JobTypeRecord {
        JobTypeRecord {
            name: name.to_string(),
            description: String::new(),
            is_active: true,
            is_shift_job: true,
            is_orion_job: false,
            requires_shift_time: true,
            benefit_system_type: system,
            manual_rewards: rewards,
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = JobTypeCatalog::from_configs(vec![
            JobTypeConfig::shift("Bar Staff"),
            JobTypeConfig::shift("Bar Staff"),
        ]);
        assert!(matches!(result, Err(RosterError::DuplicateJobType(_))));
    }

    #[test]
    fn test_lookup_and_active_filter() {
        let mut retired = JobTypeConfig::shift("Cloakroom");
        retired.is_active = false;
        let catalog =
            JobTypeCatalog::from_configs(vec![JobTypeConfig::shift("Bar Staff"), retired]).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("Bar Staff").is_some());
        assert!(catalog.get("bar staff").is_none());
        assert_eq!(catalog.active().count(), 1);
    }

    #[test]
    fn test_lenient_skips_invalid_records() {
        let catalog = JobTypeCatalog::from_records_lenient(vec![
            record("Bar Staff", BenefitSystemType::Tiered, None),
            record("Gala", BenefitSystemType::Manual, None),
            record("Bar Staff", BenefitSystemType::Manual, Some(ManualRewards::default())),
        ]);

        assert_eq!(catalog.len(), 1);
        assert!(!catalog.get("Bar Staff").unwrap().benefit_system.is_manual());
        assert!(catalog.get("Gala").is_none());
    }

    #[test]
    fn test_strict_records_fail_fast() {
        let result = JobTypeCatalog::from_records(vec![record(
            "Gala",
            BenefitSystemType::Manual,
            None,
        )]);
        assert!(matches!(result, Err(RosterError::MissingManualRewards(_))));
    }
}
