//! The rule seam
//!
//! Every coding and billing check implements [`AuditRule`]. Rules are pure:
//! they read the claim and the evaluation context and return findings.

use domain_claims::{Claim, ClaimIndex, DocumentationStatus};

use crate::catalog::CodeCatalog;
use crate::error::RuleError;
use crate::finding::Finding;

/// What a rule may consult besides the claim itself
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Code catalog of the active version
    pub catalog: &'a CodeCatalog,
    /// Documentation fetched for the claim
    pub documentation: &'a DocumentationStatus,
    /// Read-only view of the provider's population for cross-claim checks
    pub index: &'a ClaimIndex,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        catalog: &'a CodeCatalog,
        documentation: &'a DocumentationStatus,
        index: &'a ClaimIndex,
    ) -> Self {
        Self {
            catalog,
            documentation,
            index,
        }
    }
}

/// A single audit check
pub trait AuditRule: Send + Sync {
    /// Rule code (e.g. "SBS001")
    fn code(&self) -> &'static str;

    /// Short human-readable name
    fn name(&self) -> &'static str;

    /// Evaluates the claim; an empty list means the claim passes
    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError>;
}
