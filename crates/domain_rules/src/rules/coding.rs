//! SBS001: code validity

use domain_claims::Claim;

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

/// Flags codes that are unknown to the catalog or unlisted in it
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeValidityRule;

impl AuditRule for CodeValidityRule {
    fn code(&self) -> &'static str {
        "SBS001"
    }

    fn name(&self) -> &'static str {
        "code validity"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let code = claim.service_code.trim();
        let description = match ctx.catalog.entry(code) {
            None => BilingualText::new(
                format!("Service code {} does not exist in catalog {}", code, ctx.catalog.version()),
                format!("رمز الخدمة {} غير موجود في الدليل {}", code, ctx.catalog.version()),
            ),
            Some(entry) if !entry.listed => BilingualText::new(
                format!("Service code {} is unlisted and cannot be billed without review", code),
                format!("رمز الخدمة {} غير مدرج ولا يجوز المطالبة به دون مراجعة", code),
            ),
            Some(_) => return Ok(Vec::new()),
        };
        Ok(vec![Finding::new(
            self.code(),
            Severity::Critical,
            FindingCategory::Coding,
            description,
        )])
    }
}
