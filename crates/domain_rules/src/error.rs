//! Rule domain errors

use thiserror::Error;

/// Errors raised while evaluating a single rule against a claim
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Claim {claim_id} is malformed: {reason}")]
    MalformedClaim { claim_id: String, reason: String },

    #[error("Rule {rule_code} could not evaluate claim {claim_id}: {reason}")]
    Evaluation {
        rule_code: String,
        claim_id: String,
        reason: String,
    },
}

impl RuleError {
    pub fn malformed(claim_id: impl Into<String>, reason: impl Into<String>) -> Self {
        RuleError::MalformedClaim {
            claim_id: claim_id.into(),
            reason: reason.into(),
        }
    }

    pub fn evaluation(
        rule_code: impl Into<String>,
        claim_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RuleError::Evaluation {
            rule_code: rule_code.into(),
            claim_id: claim_id.into(),
            reason: reason.into(),
        }
    }
}

impl From<domain_claims::ClaimError> for RuleError {
    fn from(err: domain_claims::ClaimError) -> Self {
        match err {
            domain_claims::ClaimError::Malformed { claim_id, reason } => {
                RuleError::MalformedClaim { claim_id, reason }
            }
            domain_claims::ClaimError::NegativeAmount(claim_id) => {
                RuleError::malformed(claim_id, "amount is negative")
            }
            domain_claims::ClaimError::InvertedServiceWindow { claim_id } => {
                RuleError::malformed(claim_id, "service ends before it starts")
            }
        }
    }
}

/// Errors raised while loading a code catalog or resolving a rule set
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Catalog file not found: {0}")]
    FileNotFound(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown rule version: {0}")]
    UnknownVersion(String),
}
