//! SBS005: same-day timing

use domain_claims::Claim;

use crate::error::RuleError;
use crate::finding::{BilingualText, Finding, FindingCategory, Severity};
use crate::rule::{AuditRule, RuleContext};

/// Flags more same-day units than the catalog allows, or service windows
/// overlapping another service for the same patient
#[derive(Debug, Default, Clone, Copy)]
pub struct SameDayTimingRule;

impl AuditRule for SameDayTimingRule {
    fn code(&self) -> &'static str {
        "SBS005"
    }

    fn name(&self) -> &'static str {
        "same-day timing"
    }

    fn evaluate(&self, claim: &Claim, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let mut issues_en = Vec::new();
        let mut issues_ar = Vec::new();

        if let Some(limit) = ctx.catalog.entry(&claim.service_code).and_then(|e| e.max_per_day) {
            if limit == 0 {
                return Err(RuleError::evaluation(
                    self.code(),
                    claim.id.as_str(),
                    format!("catalog daily limit for {} is zero", claim.service_code),
                ));
            }
            let units = ctx.index.same_day_units(claim);
            if units > limit as usize {
                issues_en.push(format!("{} units billed against a daily limit of {}", units, limit));
                issues_ar.push(format!("{} وحدات مقابل حد يومي قدره {}", units, limit));
            }
        }

        let overlapping: Vec<&str> = ctx
            .index
            .same_encounter(claim)
            .filter(|other| claim.overlaps(other))
            .map(|other| other.id.as_str())
            .collect();
        if !overlapping.is_empty() {
            issues_en.push(format!("service window overlaps {}", overlapping.join(", ")));
            issues_ar.push(format!("فترة الخدمة تتداخل مع {}", overlapping.join("، ")));
        }

        if issues_en.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::new(
            self.code(),
            Severity::Medium,
            FindingCategory::Timing,
            BilingualText::new(
                format!("Timing conflict on {}: {}", claim.service_code, issues_en.join("; ")),
                format!("تعارض زمني في {}: {}", claim.service_code, issues_ar.join("؛ ")),
            ),
        )])
    }
}
