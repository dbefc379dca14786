//! Audit domain errors

use thiserror::Error;

use core_kernel::{PortError, TemporalError};
use domain_rules::CatalogError;

/// Errors that end an audit run without a report
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown rule version: {0}")]
    UnknownRuleVersion(String),

    #[error("Claim source unavailable for provider {provider_id}: {source}")]
    ClaimSourceUnavailable {
        provider_id: String,
        #[source]
        source: PortError,
    },

    #[error("No claims found for provider {provider_id} in the audit period")]
    EmptyPopulation { provider_id: String },

    #[error("No auditable claims for provider {provider_id}: all {excluded} sampled claims were unauditable")]
    NoAuditableClaims { provider_id: String, excluded: usize },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Audit run {run_id} was cancelled")]
    Cancelled { run_id: String },

    #[error("Report localization failed: {0}")]
    Localization(String),

    #[error("Claim evaluation task failed: {0}")]
    Worker(String),
}

impl AuditError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        AuditError::InvalidConfiguration(message.into())
    }

    /// Returns true if the run was rejected before any I/O
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AuditError::InvalidConfiguration(_) | AuditError::UnknownRuleVersion(_)
        )
    }
}

impl From<TemporalError> for AuditError {
    fn from(err: TemporalError) -> Self {
        AuditError::InvalidConfiguration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_error_is_a_configuration_error() {
        let err: AuditError = TemporalError::UnknownTimezone("Mars/Olympus".to_string()).into();

        assert!(matches!(err, AuditError::InvalidConfiguration(_)));
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_run_failures_are_not_configuration_errors() {
        let unavailable = AuditError::ClaimSourceUnavailable {
            provider_id: "PRV-1".to_string(),
            source: PortError::connection("warehouse down"),
        };
        let empty = AuditError::EmptyPopulation {
            provider_id: "PRV-1".to_string(),
        };

        assert!(!unavailable.is_configuration_error());
        assert!(!empty.is_configuration_error());
        assert!(unavailable.to_string().contains("warehouse down"));
    }
}
