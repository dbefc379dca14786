//! Claims domain errors

use thiserror::Error;

/// Errors that can occur in the claims domain
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Claim {claim_id} is malformed: {reason}")]
    Malformed { claim_id: String, reason: String },

    #[error("Claim {0} has a negative amount")]
    NegativeAmount(String),

    #[error("Claim {claim_id} ends before it starts")]
    InvertedServiceWindow { claim_id: String },
}

impl ClaimError {
    /// Creates a malformed-claim error
    pub fn malformed(claim_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ClaimError::Malformed {
            claim_id: claim_id.into(),
            reason: reason.into(),
        }
    }
}
