//! Audit report assembly
//!
//! The report is a read-only projection of a sealed [`AuditRun`]. Summary
//! and next-step text is rendered from the Fluent resources for `en-US` and
//! `ar-SA`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditPeriod, AuditRunId, ProviderId};
use domain_rules::{BilingualText, FindingCategory, Severity};

use crate::corrective::{ActionCategory, CorrectivePlan};
use crate::error::AuditError;
use crate::fraud::{FraudIndicator, FraudResponse, FraudRiskLevel};
use crate::i18n::{Locale, LocalizationError, Localizer};
use crate::outcome::AuditOutcome;
use crate::risk::RiskLevel;
use crate::run::{AuditRun, UnauditableClaim};

/// Occurrences of one rule code at one severity across the sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingBreakdown {
    pub rule_code: String,
    pub category: FindingCategory,
    pub severity: Severity,
    pub occurrences: usize,
    /// Penalty points before the per-case cap
    pub points: u32,
    /// Description of the first occurrence in claim id order
    pub description: BilingualText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: AuditRunId,
    pub provider_id: ProviderId,
    pub period: AuditPeriod,
    pub rule_version: String,
    pub compliance_score: f64,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub audit_outcome: AuditOutcome,
    pub requested_sample_size: u32,
    pub effective_sample_size: usize,
    /// Cases with at least one finding
    pub total_errors: usize,
    pub unauditable_claims: Vec<UnauditableClaim>,
    pub findings: Vec<FindingBreakdown>,
    pub severity_totals: BTreeMap<Severity, usize>,
    pub fraud_risk_score: u32,
    pub fraud_level: FraudRiskLevel,
    pub fraud_indicators: Vec<FraudIndicator>,
    pub fraud_responses: Vec<FraudResponse>,
    pub corrective_plan: CorrectivePlan,
    pub next_steps: Vec<BilingualText>,
    pub summary_en: String,
    pub summary_ar: String,
    pub generated_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn from_run(run: &AuditRun) -> Result<Self, AuditError> {
        let en = Localizer::new(Locale::EnUs)?;
        let ar = Localizer::new(Locale::ArSa)?;

        Ok(Self {
            run_id: run.id,
            provider_id: run.provider_id.clone(),
            period: run.period.clone(),
            rule_version: run.rule_version.clone(),
            compliance_score: run.compliance_score,
            risk_level: run.risk_profile.risk_level,
            risk_score: run.risk_profile.overall_risk,
            audit_outcome: run.outcome,
            requested_sample_size: run.sample.requested,
            effective_sample_size: run.effective_sample_size(),
            total_errors: run.total_errors(),
            unauditable_claims: run.unauditable.clone(),
            findings: breakdown(run),
            severity_totals: severity_totals(run),
            fraud_risk_score: run.fraud.fraud_risk_score,
            fraud_level: run.fraud.level,
            fraud_indicators: run.fraud.indicators.clone(),
            fraud_responses: run.fraud.recommended_responses.clone(),
            corrective_plan: run.corrective_plan.clone(),
            next_steps: next_steps(run, &en, &ar)?,
            summary_en: summary(run, &en)?,
            summary_ar: summary(run, &ar)?,
            generated_at: run.generated_at,
        })
    }

    /// Serializes the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<LocalizationError> for AuditError {
    fn from(err: LocalizationError) -> Self {
        AuditError::Localization(err.to_string())
    }
}

fn breakdown(run: &AuditRun) -> Vec<FindingBreakdown> {
    let mut rows: BTreeMap<(String, Severity), FindingBreakdown> = BTreeMap::new();
    for finding in run.case_results.iter().flat_map(|r| r.findings.iter()) {
        rows.entry((finding.rule_code.clone(), finding.severity))
            .and_modify(|row| {
                row.occurrences += 1;
                row.points += finding.points;
            })
            .or_insert_with(|| FindingBreakdown {
                rule_code: finding.rule_code.clone(),
                category: finding.category,
                severity: finding.severity,
                occurrences: 1,
                points: finding.points,
                description: finding.description.clone(),
            });
    }
    rows.into_values().collect()
}

fn severity_totals(run: &AuditRun) -> BTreeMap<Severity, usize> {
    let mut totals: BTreeMap<Severity, usize> = Severity::all().into_iter().map(|s| (s, 0)).collect();
    for finding in run.case_results.iter().flat_map(|r| r.findings.iter()) {
        *totals.entry(finding.severity).or_insert(0) += 1;
    }
    totals
}

fn outcome_message(outcome: AuditOutcome) -> &'static str {
    match outcome {
        AuditOutcome::Compliant => "outcome-compliant",
        AuditOutcome::MinorIssues => "outcome-minor-issues",
        AuditOutcome::NeedsImprovement => "outcome-needs-improvement",
        AuditOutcome::NonCompliant => "outcome-non-compliant",
        AuditOutcome::Critical => "outcome-critical",
    }
}

fn date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

fn summary(run: &AuditRun, localizer: &Localizer) -> Result<String, LocalizationError> {
    let outcome = localizer.message(outcome_message(run.outcome), &[])?;
    let risk_level = localizer.message(&format!("level-{}", run.risk_profile.risk_level), &[])?;
    let fraud_level = localizer.message(&format!("level-{}", run.fraud.level), &[])?;

    localizer.message(
        "audit-summary",
        &[
            ("run", run.id.to_string()),
            ("provider", run.provider_id.to_string()),
            ("period", format!("{} - {}", date(run.period.start), date(run.period.end))),
            ("score", format!("{:.2}", run.compliance_score)),
            ("outcome", outcome),
            ("errors", run.total_errors().to_string()),
            ("sample", run.effective_sample_size().to_string()),
            ("unauditable", run.unauditable.len().to_string()),
            ("risk_level", risk_level),
            ("fraud_level", fraud_level),
            ("fraud_score", run.fraud.fraud_risk_score.to_string()),
            ("actions", run.corrective_plan.actions.len().to_string()),
            ("deadline", date(run.corrective_plan.completion_target)),
        ],
    )
}

fn bilingual(
    en: &Localizer,
    ar: &Localizer,
    id: &str,
    args: &[(&str, String)],
) -> Result<BilingualText, LocalizationError> {
    Ok(BilingualText::new(en.message(id, args)?, ar.message(id, args)?))
}

fn next_steps(run: &AuditRun, en: &Localizer, ar: &Localizer) -> Result<Vec<BilingualText>, LocalizationError> {
    let plan = &run.corrective_plan;
    let mut steps = Vec::new();
    if plan.is_empty() {
        steps.push(bilingual(en, ar, "next-step-none", &[])?);
    } else {
        steps.push(bilingual(
            en,
            ar,
            "next-step-actions",
            &[
                ("actions", plan.actions.len().to_string()),
                ("deadline", date(plan.completion_target)),
            ],
        )?);
    }
    for response in &run.fraud.recommended_responses {
        match response {
            FraudResponse::Monitor => {}
            FraudResponse::InitiateInvestigation => steps.push(bilingual(en, ar, "next-step-investigation", &[])?),
            FraudResponse::ReferToRegulator => steps.push(bilingual(en, ar, "next-step-regulator", &[])?),
        }
    }
    if let Some(follow_up) = plan.action(ActionCategory::FollowUpAudit) {
        steps.push(bilingual(
            en,
            ar,
            "next-step-follow-up",
            &[("days", follow_up.deadline_days.to_string())],
        )?);
    }
    Ok(steps)
}
