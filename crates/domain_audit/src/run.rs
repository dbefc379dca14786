//! Sealed audit runs
//!
//! An [`AuditRun`] is assembled once every case has been evaluated and is
//! never modified afterwards. [`AuditRunSummary`] is the slice of a run the
//! history store keeps for future risk profiling.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AuditPeriod, AuditRunId, ClaimId, ProviderId};
use domain_claims::Claim;
use domain_rules::CaseResult;

use crate::corrective::CorrectivePlan;
use crate::fraud::FraudAssessment;
use crate::outcome::AuditOutcome;
use crate::population::PopulationSummary;
use crate::risk::RiskProfile;
use crate::sampling::AuditSample;

/// Historical record of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRunSummary {
    pub run_id: AuditRunId,
    pub provider_id: ProviderId,
    pub period: AuditPeriod,
    pub generated_at: DateTime<Utc>,
    pub compliance_score: f64,
    pub outcome: AuditOutcome,
    pub population: PopulationSummary,
    /// Service codes of cases that carried findings
    #[serde(default)]
    pub flagged_codes: Vec<String>,
}

/// A sampled claim that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnauditableClaim {
    pub claim_id: ClaimId,
    pub reason: String,
}

/// A completed, sealed audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRun {
    pub id: AuditRunId,
    pub provider_id: ProviderId,
    pub period: AuditPeriod,
    pub rule_version: String,
    pub risk_profile: RiskProfile,
    pub sample: AuditSample,
    /// Audited claims ordered by claim id
    pub audited_claims: Vec<Claim>,
    /// Case results ordered by claim id
    pub case_results: Vec<CaseResult>,
    pub unauditable: Vec<UnauditableClaim>,
    pub fraud: FraudAssessment,
    pub compliance_score: f64,
    pub outcome: AuditOutcome,
    pub corrective_plan: CorrectivePlan,
    pub population: PopulationSummary,
    pub generated_at: DateTime<Utc>,
}

impl AuditRun {
    /// Cases actually scored
    pub fn effective_sample_size(&self) -> usize {
        self.case_results.len()
    }

    /// Cases with at least one finding
    pub fn total_errors(&self) -> usize {
        self.case_results.iter().filter(|r| r.has_findings()).count()
    }

    pub fn summary(&self) -> AuditRunSummary {
        let flagged: BTreeSet<String> = self
            .case_results
            .iter()
            .filter(|r| r.has_findings())
            .filter_map(|r| self.audited_claims.iter().find(|c| c.id == r.claim_id))
            .map(|c| c.service_code.clone())
            .collect();

        AuditRunSummary {
            run_id: self.id,
            provider_id: self.provider_id.clone(),
            period: self.period.clone(),
            generated_at: self.generated_at,
            compliance_score: self.compliance_score,
            outcome: self.outcome,
            population: self.population.clone(),
            flagged_codes: flagged.into_iter().collect(),
        }
    }
}
