//! SBS002: medical necessity

use domain_claims::Claim;

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

/// Requires a diagnosis that establishes medical necessity for the service
///
/// Unknown codes are left to SBS001.
#[derive(Debug, Default, Clone, Copy)]
pub struct MedicalNecessityRule;

impl AuditRule for MedicalNecessityRule {
    fn code(&self) -> &'static str {
        "SBS002"
    }

    fn name(&self) -> &'static str {
        "medical necessity"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Some(entry) = ctx.catalog.entry(&claim.service_code) else {
            return Ok(Vec::new());
        };
        if entry.supports_diagnoses(&claim.diagnosis_codes) {
            return Ok(Vec::new());
        }

        let description = if claim.diagnosis_codes.is_empty() {
            BilingualText::new(
                format!("No diagnosis supports service {}", entry.code),
                format!("لا يوجد تشخيص يدعم الخدمة {}", entry.code),
            )
        } else {
            let diagnoses = claim.diagnosis_codes.join(", ");
            BilingualText::new(
                format!("Diagnoses {} do not establish medical necessity for {}", diagnoses, entry.code),
                format!("التشخيصات {} لا تثبت الضرورة الطبية للخدمة {}", diagnoses, entry.code),
            )
        };
        Ok(vec![Finding::new(
            self.code(),
            Severity::High,
            FindingCategory::Clinical,
            description,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CodeCatalog;
    use crate::rules::test_support::claim;
    use domain_claims::{ClaimIndex, DocumentationStatus};
    use rust_decimal_macros::dec;

    fn run(code: &str, diagnoses: &[&str]) -> Vec<Finding> {
        let catalog = CodeCatalog::standard().unwrap();
        let mut c = claim("C1", code, dec!(100));
        c.diagnosis_codes = diagnoses.iter().map(|d| d.to_string()).collect();
        let index = ClaimIndex::new(&[c.clone()], Default::default());
        let docs = DocumentationStatus::NotReferenced;
        MedicalNecessityRule
            .evaluate(&c, &RuleContext::new(&catalog, &docs, &index))
            .unwrap()
    }

    #[test]
    fn test_matching_diagnosis_passes() {
        assert!(run("97110", &["M54.5"]).is_empty());
    }

    #[test]
    fn test_unrelated_diagnosis_is_flagged() {
        let findings = run("97110", &["J06.9"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].category, FindingCategory::Clinical);
    }

    #[test]
    fn test_missing_diagnosis_is_flagged() {
        assert_eq!(run("99213", &[]).len(), 1);
    }

    #[test]
    fn test_unknown_code_is_skipped() {
        assert!(run("00000", &[]).is_empty());
    }
}
