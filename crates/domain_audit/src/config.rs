//! Audit configuration
//!
//! [`AuditConfiguration`] is the caller's request for one run.
//! [`AuditPolicy`] carries engine tuning that callers rarely change.

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{AuditPeriod, ProviderId, RetryPolicy, Timezone};
use domain_claims::OperatingHours;
use domain_rules::RuleRegistry;

use crate::error::AuditError;

fn default_true() -> bool {
    true
}

/// Request for a single audit run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AuditConfiguration {
    /// Audited provider
    #[validate(length(min = 1, message = "provider_id is required"))]
    pub provider_id: String,
    /// Service period under audit
    pub audit_period: AuditPeriod,
    /// Requested number of claims
    #[validate(range(min = 1, message = "sample_size must be at least 1"))]
    pub sample_size: u32,
    /// Stratified sampling when true, uniform random otherwise
    #[serde(default = "default_true")]
    pub risk_based_sampling: bool,
    /// Service categories to over-sample
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Provider region (drives time zone and peer benchmark)
    #[serde(default)]
    pub region: String,
    /// Rule set version
    #[validate(length(min = 1, message = "rule_version is required"))]
    pub rule_version: String,
    /// Seed for every random draw of the run
    pub random_seed: u64,
}

impl AuditConfiguration {
    /// Validates the request against the available rule sets
    ///
    /// Runs before any I/O; a failure here never creates a run.
    pub fn validate_for(&self, registry: &RuleRegistry) -> Result<(), AuditError> {
        self.validate()
            .map_err(|e| AuditError::invalid_configuration(e.to_string()))?;
        if self.provider_id.trim().is_empty() {
            return Err(AuditError::invalid_configuration("provider_id is blank"));
        }
        self.audit_period.validate()?;
        if !registry.has_version(&self.rule_version) {
            return Err(AuditError::UnknownRuleVersion(self.rule_version.clone()));
        }
        Ok(())
    }

    pub fn provider(&self) -> ProviderId {
        ProviderId::new(self.provider_id.trim())
    }

    pub fn timezone(&self) -> Timezone {
        Timezone::for_region(&self.region)
    }

    /// Stable name the run id is derived from
    pub fn run_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.provider_id.trim(),
            self.audit_period.key(),
            self.sample_size,
            self.random_seed,
            self.rule_version.trim()
        )
    }
}

/// Engine tuning for audit runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPolicy {
    /// Claims evaluated concurrently
    pub max_concurrency: usize,
    /// Critical findings a single case may carry before the run escalates
    pub critical_findings_per_case_limit: usize,
    /// Retry policy for external fetches
    pub retry: RetryPolicy,
    /// Normal operating hours in region-local time
    pub operating_hours: OperatingHours,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            critical_findings_per_case_limit: 2,
            retry: RetryPolicy::default(),
            operating_hours: OperatingHours::default(),
        }
    }
}

impl AuditPolicy {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config() -> AuditConfiguration {
        AuditConfiguration {
            provider_id: "PRV-1".to_string(),
            audit_period: AuditPeriod::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            )
            .unwrap(),
            sample_size: 50,
            risk_based_sampling: true,
            focus_areas: vec![],
            region: "Riyadh".to_string(),
            rule_version: "2.0".to_string(),
            random_seed: 7,
        }
    }

    #[test]
    fn test_valid_configuration() {
        assert!(config().validate_for(&RuleRegistry::standard()).is_ok());
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        let mut c = config();
        c.sample_size = 0;
        let err = c.validate_for(&RuleRegistry::standard()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_inverted_period_rejected() {
        let mut c = config();
        std::mem::swap(&mut c.audit_period.start, &mut c.audit_period.end);
        assert!(matches!(
            c.validate_for(&RuleRegistry::standard()),
            Err(AuditError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_blank_provider_rejected() {
        let mut c = config();
        c.provider_id = "   ".to_string();
        assert!(c.validate_for(&RuleRegistry::standard()).is_err());
    }

    #[test]
    fn test_unknown_rule_version_rejected() {
        let mut c = config();
        c.rule_version = "3.1".to_string();
        assert!(matches!(
            c.validate_for(&RuleRegistry::standard()),
            Err(AuditError::UnknownRuleVersion(_))
        ));
    }

    #[test]
    fn test_run_key_changes_with_seed() {
        let mut other = config();
        other.random_seed = 8;
        assert_ne!(config().run_key(), other.run_key());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "provider_id": "PRV-1",
            "audit_period": { "start": "2024-01-01T00:00:00Z", "end": "2024-04-01T00:00:00Z" },
            "sample_size": 10,
            "rule_version": "2.0",
            "random_seed": 1
        }"#;
        let c: AuditConfiguration = serde_json::from_str(json).unwrap();
        assert!(c.risk_based_sampling);
        assert!(c.focus_areas.is_empty());
    }
}
