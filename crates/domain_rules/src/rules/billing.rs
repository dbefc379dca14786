//! SBS004: billing-system checks
//!
//! Four independent rules share the SBS004 family code and the
//! billing-system category: unbundling, upcoding, duplicate billing and
//! fee schedule ceilings.

use rust_decimal::Decimal;

use domain_claims::Claim;

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

fn billing_finding(code: &str, severity: Severity, description: BilingualText) -> Vec<Finding> {
    vec![Finding::new(code, severity, FindingCategory::BillingSystem, description)]
}

/// Flags a component billed on the same patient and day as a comprehensive
/// code that already includes it
#[derive(Debug, Default, Clone, Copy)]
pub struct UnbundlingRule;

impl AuditRule for UnbundlingRule {
    fn code(&self) -> &'static str {
        "SBS004-U"
    }

    fn name(&self) -> &'static str {
        "unbundling"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let component = claim.service_code.trim();
        let bundled_with = ctx.catalog.comprehensive_codes_for(component).find(|comprehensive| {
            ctx.index
                .same_encounter(claim)
                .any(|other| other.service_code.trim() == *comprehensive)
        });

        match bundled_with {
            Some(comprehensive) => Ok(billing_finding(
                self.code(),
                Severity::High,
                BilingualText::new(
                    format!("Component {} billed separately from comprehensive code {}", component, comprehensive),
                    format!("تمت المطالبة بالمكوّن {} بشكل منفصل عن الرمز الشامل {}", component, comprehensive),
                ),
            )),
            None => Ok(Vec::new()),
        }
    }
}

/// Flags tiered codes billed with fewer diagnoses than the tier requires
#[derive(Debug, Default, Clone, Copy)]
pub struct UpcodingRule;

impl AuditRule for UpcodingRule {
    fn code(&self) -> &'static str {
        "SBS004-C"
    }

    fn name(&self) -> &'static str {
        "upcoding"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Some(entry) = ctx.catalog.entry(&claim.service_code) else {
            return Ok(Vec::new());
        };
        let (Some(tier), Some(required)) = (entry.tier, entry.min_diagnoses) else {
            return Ok(Vec::new());
        };

        let documented = claim.diagnosis_codes.len() as u32;
        if documented >= required {
            return Ok(Vec::new());
        }
        Ok(billing_finding(
            self.code(),
            Severity::High,
            BilingualText::new(
                format!(
                    "Level {} code {} requires {} diagnoses but {} documented",
                    tier, entry.code, required, documented
                ),
                format!(
                    "الرمز {} من المستوى {} يتطلب {} تشخيصات بينما وُثّق {}",
                    entry.code, tier, required, documented
                ),
            ),
        ))
    }
}

/// Flags another claim for the same patient, code and service date
#[derive(Debug, Default, Clone, Copy)]
pub struct DuplicateBillingRule;

impl AuditRule for DuplicateBillingRule {
    fn code(&self) -> &'static str {
        "SBS004-D"
    }

    fn name(&self) -> &'static str {
        "duplicate billing"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let duplicates = ctx.index.duplicates_of(claim);
        if duplicates.is_empty() {
            return Ok(Vec::new());
        }
        let ids = duplicates
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(billing_finding(
            self.code(),
            Severity::High,
            BilingualText::new(
                format!("Service {} billed more than once on the same day: {}", claim.service_code, ids),
                format!("تمت المطالبة بالخدمة {} أكثر من مرة في اليوم نفسه: {}", claim.service_code, ids),
            ),
        ))
    }
}

/// Flags amounts above the fee schedule maximum
#[derive(Debug, Default, Clone, Copy)]
pub struct FeeScheduleRule;

impl AuditRule for FeeScheduleRule {
    fn code(&self) -> &'static str {
        "SBS004-F"
    }

    fn name(&self) -> &'static str {
        "fee schedule"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Some(max_fee) = ctx.catalog.entry(&claim.service_code).and_then(|e| e.max_fee) else {
            return Ok(Vec::new());
        };
        if max_fee < Decimal::ZERO {
            return Err(RuleError::evaluation(
                self.code(),
                claim.id.as_str(),
                format!("catalog fee maximum for {} is negative", claim.service_code),
            ));
        }
        if claim.amount <= max_fee {
            return Ok(Vec::new());
        }
        Ok(billing_finding(
            self.code(),
            Severity::Medium,
            BilingualText::new(
                format!(
                    "Billed {} SAR exceeds the {} SAR fee maximum for {}",
                    claim.amount, max_fee, claim.service_code
                ),
                format!(
                    "المبلغ {} ريال يتجاوز الحد الأقصى {} ريال للخدمة {}",
                    claim.amount, max_fee, claim.service_code
                ),
            ),
        ))
    }
}
