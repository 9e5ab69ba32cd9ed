//! Configuration for the perks engine.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::ServiceDayClock;
use crate::policy::TierPolicy;
use crate::types::{PerksError, Result};

/// Allowed range for the service-day offset.
pub const OFFSET_HOURS_RANGE: std::ops::RangeInclusive<i32> = -12..=12;

/// Configuration of the perks engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerksConfig {
    /// Hours after local midnight at which the service day rolls over
    pub offset_hours: i32,
    /// IANA timezone of the venues
    pub timezone: String,
    /// Tier thresholds and benefit templates
    pub policy: TierPolicy,
}

impl Default for PerksConfig {
    fn default() -> Self {
        Self {
            offset_hours: 0,
            timezone: "Europe/Zurich".to_string(),
            policy: TierPolicy::default(),
        }
    }
}

impl PerksConfig {
    /// Load config from YAML and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builder: replace the offset, validating it.
    pub fn with_offset_hours(mut self, offset_hours: i32) -> Result<Self> {
        check_offset(offset_hours)?;
        self.offset_hours = offset_hours;
        Ok(self)
    }

    /// Parsed venue timezone.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PerksError::InvalidTimezone(self.timezone.clone()))
    }

    /// Build the service-day clock for this configuration.
    pub fn clock(&self) -> Result<ServiceDayClock> {
        check_offset(self.offset_hours)?;
        Ok(ServiceDayClock::new(self.offset_hours, self.timezone()?))
    }

    /// Reject out-of-range settings.
    pub fn validate(&self) -> Result<()> {
        check_offset(self.offset_hours)?;
        self.timezone()?;
        self.policy.validate()
    }
}

fn check_offset(offset_hours: i32) -> Result<()> {
    if OFFSET_HOURS_RANGE.contains(&offset_hours) {
        Ok(())
    } else {
        Err(PerksError::InvalidOffset(offset_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PerksConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.offset_hours, 0);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Zurich);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PerksConfig::default().with_offset_hours(4).unwrap();
        let yaml = config.to_yaml().unwrap();
        let parsed = PerksConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(matches!(
            PerksConfig::default().with_offset_hours(13),
            Err(PerksError::InvalidOffset(13))
        ));

        let config = PerksConfig {
            offset_hours: -13,
            ..Default::default()
        };
        assert!(config.clock().is_err());
        assert!(PerksConfig::default().with_offset_hours(-12).is_ok());
    }

    #[test]
    fn test_unknown_timezone() {
        let config = PerksConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PerksError::InvalidTimezone(_))));
    }

    #[test]
    fn test_yaml_policy_override() {
        let mut config = PerksConfig::default();
        config.policy.galaxie.min_jobs = 4;
        config.policy.nova.benefit.drink_tokens = 3;
        let yaml = config.to_yaml().unwrap();

        let parsed = PerksConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.policy.galaxie.min_jobs, 4);
        assert_eq!(parsed.policy.nova.benefit.drink_tokens, 3);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            PerksConfig::from_yaml("offset_hours: [not a number"),
            Err(PerksError::Config(_))
        ));
    }
}
