//! Corrective Action Plans
//!
//! Actions are chosen from the finding categories and severities present in
//! the audited cases, plus a follow-up audit whenever the score falls below
//! the minor-issues band.
//!
//! | Trigger                        | Action                   | Owner              | Days     |
//! |--------------------------------|--------------------------|--------------------|----------|
//! | any high or critical finding   | mandatory training       | coding manager     | 30       |
//! | any documentation finding      | documentation program    | medical director   | 60       |
//! | any billing-system finding     | system reconfiguration   | IT manager         | 45       |
//! | score below 85                 | follow-up audit          | compliance officer | 90 / 180 |

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::CorrectivePlanId;
use domain_rules::{BilingualText, CaseResult, FindingCategory};

use crate::outcome::AuditOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    MandatoryTraining,
    ClinicalDocumentationImprovement,
    SystemReconfiguration,
    FollowUpAudit,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionCategory::MandatoryTraining => "mandatory_training",
            ActionCategory::ClinicalDocumentationImprovement => "clinical_documentation_improvement",
            ActionCategory::SystemReconfiguration => "system_reconfiguration",
            ActionCategory::FollowUpAudit => "follow_up_audit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsibleParty {
    CodingManager,
    MedicalDirector,
    ItManager,
    ComplianceOfficer,
}

/// Who must be notified of the audit result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    Routine,
    Management,
    Executive,
    Regulatory,
}

impl EscalationLevel {
    pub fn for_outcome(outcome: AuditOutcome) -> Self {
        match outcome {
            AuditOutcome::Compliant | AuditOutcome::MinorIssues => EscalationLevel::Routine,
            AuditOutcome::NeedsImprovement => EscalationLevel::Management,
            AuditOutcome::NonCompliant => EscalationLevel::Executive,
            AuditOutcome::Critical => EscalationLevel::Regulatory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    /// `<plan id>-NNN`
    pub id: String,
    pub category: ActionCategory,
    pub title: BilingualText,
    pub description: BilingualText,
    pub responsible_party: ResponsibleParty,
    pub deadline_days: i64,
    pub due_date: DateTime<Utc>,
    pub verification_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectivePlan {
    pub plan_id: CorrectivePlanId,
    pub actions: Vec<CorrectiveAction>,
    pub run_date: DateTime<Utc>,
    pub completion_target: DateTime<Utc>,
    /// Action ids ordered by deadline
    pub critical_path: Vec<String>,
    /// Compliance score expected at the follow-up audit
    pub success_target: f64,
    pub escalation: EscalationLevel,
}

impl CorrectivePlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action(&self, category: ActionCategory) -> Option<&CorrectiveAction> {
        self.actions.iter().find(|a| a.category == category)
    }
}

/// Builds corrective plans from audit results
#[derive(Debug, Default, Clone, Copy)]
pub struct CorrectivePlanGenerator;

impl CorrectivePlanGenerator {
    pub fn generate(
        &self,
        plan_id: CorrectivePlanId,
        results: &[CaseResult],
        score: f64,
        outcome: AuditOutcome,
        run_date: DateTime<Utc>,
    ) -> CorrectivePlan {
        let findings = || results.iter().flat_map(|r| r.findings.iter());

        let mut wanted: Vec<(ActionCategory, i64)> = Vec::new();
        if findings().any(|f| f.severity.is_serious()) {
            wanted.push((ActionCategory::MandatoryTraining, 30));
        }
        if findings().any(|f| f.category == FindingCategory::Documentation) {
            wanted.push((ActionCategory::ClinicalDocumentationImprovement, 60));
        }
        if findings().any(|f| f.category == FindingCategory::BillingSystem) {
            wanted.push((ActionCategory::SystemReconfiguration, 45));
        }
        if score < 85.0 {
            wanted.push((ActionCategory::FollowUpAudit, if score < 70.0 { 90 } else { 180 }));
        }

        let actions: Vec<CorrectiveAction> = wanted
            .into_iter()
            .enumerate()
            .map(|(n, (category, days))| CorrectiveAction {
                id: format!("{}-{:03}", plan_id, n + 1),
                category,
                title: title(category),
                description: description(category, days),
                responsible_party: owner(category),
                deadline_days: days,
                due_date: run_date + Duration::days(days),
                verification_required: true,
            })
            .collect();

        let completion_target = actions
            .iter()
            .map(|a| a.due_date)
            .max()
            .unwrap_or(run_date);

        let mut by_deadline: Vec<&CorrectiveAction> = actions.iter().collect();
        by_deadline.sort_by(|a, b| a.deadline_days.cmp(&b.deadline_days).then(a.id.cmp(&b.id)));
        let critical_path = by_deadline.into_iter().map(|a| a.id.clone()).collect();

        let success_target = if score < 70.0 {
            75.0
        } else if score < 85.0 {
            85.0
        } else {
            90.0
        };

        debug!(plan_id = %plan_id, actions = actions.len(), "Corrective plan generated");
        CorrectivePlan {
            plan_id,
            actions,
            run_date,
            completion_target,
            critical_path,
            success_target,
            escalation: EscalationLevel::for_outcome(outcome),
        }
    }
}

fn owner(category: ActionCategory) -> ResponsibleParty {
    match category {
        ActionCategory::MandatoryTraining => ResponsibleParty::CodingManager,
        ActionCategory::ClinicalDocumentationImprovement => ResponsibleParty::MedicalDirector,
        ActionCategory::SystemReconfiguration => ResponsibleParty::ItManager,
        ActionCategory::FollowUpAudit => ResponsibleParty::ComplianceOfficer,
    }
}

fn title(category: ActionCategory) -> BilingualText {
    match category {
        ActionCategory::MandatoryTraining => {
            BilingualText::new("Mandatory Coding Standards Training", "تدريب إلزامي على معايير الترميز")
        }
        ActionCategory::ClinicalDocumentationImprovement => BilingualText::new(
            "Clinical Documentation Improvement Program",
            "برنامج تحسين التوثيق السريري",
        ),
        ActionCategory::SystemReconfiguration => {
            BilingualText::new("Billing System Configuration Update", "تحديث إعدادات نظام الفوترة")
        }
        ActionCategory::FollowUpAudit => BilingualText::new("Follow-up Compliance Audit", "مراجعة تدقيقية متابعة"),
    }
}

fn description(category: ActionCategory, days: i64) -> BilingualText {
    match category {
        ActionCategory::MandatoryTraining => BilingualText::new(
            "Complete Saudi Coding Standards course within 30 days",
            "إكمال دورة معايير الترميز السعودي خلال 30 يوم",
        ),
        ActionCategory::ClinicalDocumentationImprovement => BilingualText::new(
            "Implement CDI program and train physicians on accurate documentation",
            "تنفيذ برنامج CDI وتدريب الأطباء على التوثيق الدقيق",
        ),
        ActionCategory::SystemReconfiguration => BilingualText::new(
            "Review and update billing system settings to comply with CHI standards",
            "مراجعة وتحديث إعدادات نظام الفوترة لمطابقة معايير CHI",
        ),
        ActionCategory::FollowUpAudit => BilingualText::new(
            format!("Conduct follow-up audit within {} days", days),
            format!("إجراء تدقيق متابعة خلال {} يوم", days),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::ClaimId;
    use domain_rules::{Finding, Severity};

    fn run_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    fn case(findings: Vec<Finding>) -> CaseResult {
        CaseResult::new(ClaimId::new("C1"), findings, run_date())
    }

    fn finding(severity: Severity, category: FindingCategory) -> Finding {
        Finding::new("SBS000", severity, category, BilingualText::new("x", "x"))
    }

    #[test]
    fn test_clean_run_has_empty_plan() {
        let plan = CorrectivePlanGenerator.generate(
            CorrectivePlanId::from_name("clean"),
            &[case(vec![])],
            100.0,
            AuditOutcome::Compliant,
            run_date(),
        );
        assert!(plan.is_empty());
        assert_eq!(plan.completion_target, run_date());
        assert_eq!(plan.success_target, 90.0);
        assert_eq!(plan.escalation, EscalationLevel::Routine);
    }

    #[test]
    fn test_actions_follow_categories() {
        let results = vec![
            case(vec![finding(Severity::Critical, FindingCategory::Coding)]),
            case(vec![finding(Severity::Medium, FindingCategory::Documentation)]),
            case(vec![finding(Severity::Low, FindingCategory::BillingSystem)]),
        ];
        let plan = CorrectivePlanGenerator.generate(
            CorrectivePlanId::from_name("mixed"),
            &results,
            65.0,
            AuditOutcome::NeedsImprovement,
            run_date(),
        );

        let categories: Vec<_> = plan.actions.iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![
                ActionCategory::MandatoryTraining,
                ActionCategory::ClinicalDocumentationImprovement,
                ActionCategory::SystemReconfiguration,
                ActionCategory::FollowUpAudit,
            ]
        );
        assert!(plan.actions.iter().all(|a| a.verification_required));
        assert_eq!(plan.action(ActionCategory::FollowUpAudit).unwrap().deadline_days, 90);
        assert_eq!(plan.completion_target, run_date() + Duration::days(90));
        assert_eq!(plan.success_target, 75.0);
        assert!(plan.actions[0].id.ends_with("-001"));

        let deadlines: Vec<i64> = plan
            .critical_path
            .iter()
            .map(|id| plan.actions.iter().find(|a| &a.id == id).unwrap().deadline_days)
            .collect();
        assert_eq!(deadlines, vec![30, 45, 60, 90]);
    }

    #[test]
    fn test_follow_up_window_widens_above_70() {
        let plan = CorrectivePlanGenerator.generate(
            CorrectivePlanId::from_name("minor"),
            &[case(vec![finding(Severity::Low, FindingCategory::Coding)])],
            80.0,
            AuditOutcome::MinorIssues,
            run_date(),
        );
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].deadline_days, 180);
        assert!(plan.actions[0].description.en.contains("180"));
        assert_eq!(plan.success_target, 85.0);
    }

    #[test]
    fn test_escalation_by_outcome() {
        assert_eq!(EscalationLevel::for_outcome(AuditOutcome::NonCompliant), EscalationLevel::Executive);
        assert_eq!(EscalationLevel::for_outcome(AuditOutcome::Critical), EscalationLevel::Regulatory);
    }
}
