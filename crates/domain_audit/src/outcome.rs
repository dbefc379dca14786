//! Audit outcome classification

use serde::{Deserialize, Serialize};
use std::fmt;

use domain_rules::CaseResult;

use crate::fraud::FraudRiskLevel;

/// Terminal outcome of an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Compliant,
    MinorIssues,
    NeedsImprovement,
    NonCompliant,
    /// Mandatory escalation regardless of score
    Critical,
}

impl AuditOutcome {
    /// Outcome implied by the score alone
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            AuditOutcome::Compliant
        } else if score >= 75.0 {
            AuditOutcome::MinorIssues
        } else if score >= 60.0 {
            AuditOutcome::NeedsImprovement
        } else {
            AuditOutcome::NonCompliant
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuditOutcome::Compliant => "COMPLIANT",
            AuditOutcome::MinorIssues => "MINOR_ISSUES",
            AuditOutcome::NeedsImprovement => "NEEDS_IMPROVEMENT",
            AuditOutcome::NonCompliant => "NON_COMPLIANT",
            AuditOutcome::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Maps score, findings and fraud level to an outcome
#[derive(Debug, Clone, Copy)]
pub struct OutcomeClassifier {
    /// Critical findings a single case may carry before escalation
    pub critical_findings_per_case_limit: usize,
}

impl Default for OutcomeClassifier {
    fn default() -> Self {
        Self {
            critical_findings_per_case_limit: 2,
        }
    }
}

impl OutcomeClassifier {
    pub fn new(critical_findings_per_case_limit: usize) -> Self {
        Self {
            critical_findings_per_case_limit,
        }
    }

    pub fn classify(&self, score: f64, results: &[CaseResult], fraud_level: FraudRiskLevel) -> AuditOutcome {
        if self.requires_escalation(results, fraud_level) {
            return AuditOutcome::Critical;
        }
        AuditOutcome::from_score(score)
    }

    /// Critical fraud risk, or a case over the critical-finding limit
    pub fn requires_escalation(&self, results: &[CaseResult], fraud_level: FraudRiskLevel) -> bool {
        fraud_level == FraudRiskLevel::Critical
            || results
                .iter()
                .any(|r| r.critical_count() > self.critical_findings_per_case_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::ClaimId;
    use domain_rules::{BilingualText, Finding, FindingCategory, Severity};

    fn case_with_criticals(n: usize) -> CaseResult {
        let findings = (0..n)
            .map(|_| Finding::new("SBS001", Severity::Critical, FindingCategory::Coding, BilingualText::new("x", "x")))
            .collect();
        CaseResult::new(ClaimId::new("C1"), findings, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_score_thresholds() {
        assert_eq!(AuditOutcome::from_score(100.0), AuditOutcome::Compliant);
        assert_eq!(AuditOutcome::from_score(90.0), AuditOutcome::Compliant);
        assert_eq!(AuditOutcome::from_score(89.99), AuditOutcome::MinorIssues);
        assert_eq!(AuditOutcome::from_score(75.0), AuditOutcome::MinorIssues);
        assert_eq!(AuditOutcome::from_score(60.0), AuditOutcome::NeedsImprovement);
        assert_eq!(AuditOutcome::from_score(59.9), AuditOutcome::NonCompliant);
    }

    #[test]
    fn test_critical_fraud_overrides_score() {
        let outcome = OutcomeClassifier::default().classify(100.0, &[], FraudRiskLevel::Critical);
        assert_eq!(outcome, AuditOutcome::Critical);
    }

    #[test]
    fn test_critical_findings_limit() {
        let classifier = OutcomeClassifier::default();
        assert_eq!(
            classifier.classify(95.0, &[case_with_criticals(2)], FraudRiskLevel::Low),
            AuditOutcome::Compliant
        );
        assert_eq!(
            classifier.classify(95.0, &[case_with_criticals(3)], FraudRiskLevel::Low),
            AuditOutcome::Critical
        );
    }

    #[test]
    fn test_serialized_form() {
        assert_eq!(serde_json::to_string(&AuditOutcome::MinorIssues).unwrap(), "\"MINOR_ISSUES\"");
    }
}
