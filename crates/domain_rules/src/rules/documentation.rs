//! SBS003: documentation completeness

use domain_claims::{Claim, DocumentationStatus};

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

/// Requires a signed clinical record with every required section
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentationRule;

impl DocumentationRule {
    fn finding(&self, description: BilingualText) -> Vec<Finding> {
        vec![Finding::new(
            "SBS003",
            Severity::Medium,
            FindingCategory::Documentation,
            description,
        )]
    }
}

impl AuditRule for DocumentationRule {
    fn code(&self) -> &'static str {
        "SBS003"
    }

    fn name(&self) -> &'static str {
        "documentation completeness"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let doc = match ctx.documentation {
            DocumentationStatus::NotReferenced => {
                return Ok(self.finding(BilingualText::new(
                    "Claim carries no clinical documentation reference",
                    "المطالبة لا تتضمن مرجعاً للتوثيق السريري",
                )));
            }
            DocumentationStatus::Missing { reference } => {
                return Ok(self.finding(BilingualText::new(
                    format!("Clinical documentation {} could not be found", reference),
                    format!("تعذر العثور على التوثيق السريري {}", reference),
                )));
            }
            DocumentationStatus::Attached(doc) => doc,
        };

        let missing = doc.missing_sections(ctx.catalog.required_sections(&claim.service_code));
        let mut gaps_en = Vec::new();
        let mut gaps_ar = Vec::new();
        if !missing.is_empty() {
            gaps_en.push(format!("missing sections: {}", missing.join(", ")));
            gaps_ar.push(format!("أقسام ناقصة: {}", missing.join("، ")));
        }
        if !doc.physician_signed {
            gaps_en.push("not signed by the treating physician".to_string());
            gaps_ar.push("غير موقع من الطبيب المعالج".to_string());
        }
        if gaps_en.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.finding(BilingualText::new(
            format!("Documentation {} is incomplete: {}", doc.reference, gaps_en.join("; ")),
            format!("التوثيق {} غير مكتمل: {}", doc.reference, gaps_ar.join("؛ ")),
        )))
    }
}
