//! Rule Engine
//!
//! Runs an ordered rule set against one claim and collects the findings
//! into a [`CaseResult`]. Malformed claims and rules that fail to evaluate
//! never abort an audit: both become a single synthetic SBS999 finding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::ClaimId;
use domain_claims::Claim;

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

/// Maximum penalty points a single case can accumulate
pub const MAX_CASE_POINTS: u32 = 25;

/// Code of the synthetic finding for claims that cannot be verified
pub const UNVERIFIABLE_CODE: &str = "SBS999";

/// Outcome of auditing one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    pub claim_id: ClaimId,
    /// Findings in rule order
    pub findings: Vec<Finding>,
    /// Penalty points, capped at [`MAX_CASE_POINTS`]
    pub total_points: u32,
    /// Penalty points before the cap
    pub raw_points: u32,
    pub audited_at: DateTime<Utc>,
}

impl CaseResult {
    /// Builds a case result; points are summed and capped
    pub fn new(claim_id: ClaimId, findings: Vec<Finding>, audited_at: DateTime<Utc>) -> Self {
        let raw_points: u32 = findings.iter().map(|f| f.points).sum();
        Self {
            claim_id,
            findings,
            total_points: raw_points.min(MAX_CASE_POINTS),
            raw_points,
            audited_at,
        }
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn critical_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_critical()).count()
    }

    pub fn has_category(&self, category: FindingCategory) -> bool {
        self.findings.iter().any(|f| f.category == category)
    }

    /// Returns true if any finding carries the rule code
    pub fn has_rule(&self, rule_code: &str) -> bool {
        self.findings.iter().any(|f| f.rule_code == rule_code)
    }
}

/// Evaluates claims against an ordered rule set
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn AuditRule>>,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<&str> = self.rules.iter().map(|r| r.code()).collect();
        f.debug_struct("RuleEngine").field("rules", &codes).finish()
    }
}

impl RuleEngine {
    pub fn new(rules: Vec<Arc<dyn AuditRule>>) -> Self {
        Self { rules }
    }

    /// Codes of the active rules, in evaluation order
    pub fn rule_codes(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    /// Evaluates one claim
    ///
    /// # Arguments
    ///
    /// * `claim` - The sampled claim
    /// * `ctx` - Catalog, fetched documentation and population index
    /// * `audited_at` - Timestamp recorded on the result
    pub fn evaluate(
        &self,
        claim: &Claim,
        ctx: &RuleContext<'_>,
        audited_at: DateTime<Utc>,
    ) -> CaseResult {
        if let Err(err) = claim.validate_shape() {
            let err = RuleError::from(err);
            warn!(claim_id = %claim.id, error = %err, "Malformed claim marked unverifiable");
            return CaseResult::new(claim.id.clone(), vec![unverifiable(&err)], audited_at);
        }

        let mut findings = Vec::new();
        let mut failure: Option<RuleError> = None;
        for rule in &self.rules {
            match rule.evaluate(claim, ctx) {
                Ok(mut rule_findings) => {
                    debug!(
                        claim_id = %claim.id,
                        rule = rule.code(),
                        findings = rule_findings.len(),
                        "Rule evaluated"
                    );
                    findings.append(&mut rule_findings);
                }
                Err(err) => {
                    warn!(claim_id = %claim.id, rule = rule.code(), error = %err, "Rule evaluation failed");
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            findings.push(unverifiable(&err));
        }

        CaseResult::new(claim.id.clone(), findings, audited_at)
    }
}

fn unverifiable(err: &RuleError) -> Finding {
    Finding::new(
        UNVERIFIABLE_CODE,
        Severity::Critical,
        FindingCategory::Unverifiable,
        BilingualText::new(
            format!("Claim could not be verified: {}", err),
            "تعذر التحقق من المطالبة بسبب بيانات غير صالحة",
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CodeCatalog;
    use crate::registry::RuleRegistry;
    use crate::rules::test_support::{at, claim};
    use domain_claims::{ClaimIndex, ClinicalDocument, DocumentationStatus};
    use rust_decimal_macros::dec;

    fn signed_doc() -> DocumentationStatus {
        DocumentationStatus::Attached(ClinicalDocument {
            reference: "DOC-C1".to_string(),
            sections: vec!["history".into(), "assessment".into(), "plan".into()],
            physician_signed: true,
            recorded_at: None,
        })
    }

    fn engine(version: &str) -> RuleEngine {
        RuleEngine::new(RuleRegistry::standard().rules_for(version).unwrap())
    }

    struct FailingRule;

    impl AuditRule for FailingRule {
        fn code(&self) -> &'static str {
            "TEST-FAIL"
        }
        fn name(&self) -> &'static str {
            "always fails"
        }
        fn evaluate(&self, claim: &Claim, _ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
            Err(RuleError::evaluation("TEST-FAIL", claim.id.as_str(), "boom"))
        }
    }

    #[test]
    fn test_clean_claim_has_no_findings() {
        let catalog = CodeCatalog::standard().unwrap();
        let c = claim("C1", "97110", dec!(150));
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = signed_doc();

        let result = engine("2.0").evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        assert!(result.findings.is_empty());
        assert_eq!(result.total_points, 0);
        assert_eq!(result.audited_at, at(12));
    }

    #[test]
    fn test_points_are_capped() {
        let catalog = CodeCatalog::standard().unwrap();
        // unknown code (10) + missing documentation (3) -> 13, below cap
        let mut c = claim("C1", "00000", dec!(150));
        c.documentation_ref = None;
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = DocumentationStatus::NotReferenced;
        let result = engine("2.0").evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        assert_eq!(result.total_points, 13);

        let findings = (0..4)
            .map(|_| unverifiable(&RuleError::malformed("C9", "x")))
            .collect();
        let capped = CaseResult::new(ClaimId::new("C9"), findings, at(12));
        assert_eq!(capped.raw_points, 40);
        assert_eq!(capped.total_points, MAX_CASE_POINTS);
        assert_eq!(capped.critical_count(), 4);
    }

    #[test]
    fn test_malformed_claim_becomes_unverifiable() {
        let catalog = CodeCatalog::standard().unwrap();
        let c = claim("C1", "99213", dec!(-5));
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = signed_doc();

        let result = engine("2.0").evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].rule_code, UNVERIFIABLE_CODE);
        assert_eq!(result.findings[0].category, FindingCategory::Unverifiable);
        assert_eq!(result.total_points, 10);
    }

    #[test]
    fn test_rule_error_becomes_single_unverifiable_finding() {
        let catalog = CodeCatalog::standard().unwrap();
        let c = claim("C1", "97110", dec!(150));
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = signed_doc();
        let engine = RuleEngine::new(vec![Arc::new(FailingRule), Arc::new(FailingRule)]);

        let result = engine.evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        assert_eq!(result.findings.len(), 1);
        assert!(result.has_rule(UNVERIFIABLE_CODE));
    }

    #[test]
    fn test_version_one_ignores_billing_rules() {
        let catalog = CodeCatalog::standard().unwrap();
        let c = claim("C1", "97110", dec!(999));
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = signed_doc();

        let v1 = engine("1.0").evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        let v2 = engine("2.0").evaluate(&c, &RuleContext::new(&catalog, &docs, &index), at(12));
        assert!(v1.findings.is_empty());
        assert!(v2.has_rule("SBS004-F"));
    }
}
