//! Audit Domain
//!
//! This crate runs provider compliance audits end to end: it profiles the
//! provider's risk, draws a stratified sample, evaluates every sampled claim
//! against the rule set, looks for fraud signatures across the sample, and
//! turns the results into a score, an outcome and a corrective plan.
//!
//! # Run lifecycle
//!
//! ```text
//! AuditConfiguration ──validate──> AuditOrchestrator::run_sealed
//!                                        │
//!      RiskProfile ─> AuditSample ─> CaseResult* ─> FraudAssessment
//!                                        │
//!          compliance score ─> AuditOutcome ─> CorrectivePlan
//!                                        │
//!                           sealed AuditRun ─> AuditReport
//! ```
//!
//! A sealed run is never modified. Every random draw uses the configured
//! seed and every timestamp comes from the injected clock, so the same
//! request over the same data reproduces the same report.

pub mod cancel;
pub mod config;
pub mod corrective;
pub mod error;
pub mod fraud;
pub mod i18n;
pub mod orchestrator;
pub mod outcome;
pub mod population;
pub mod ports;
pub mod report;
pub mod risk;
pub mod run;
pub mod sampling;
pub mod scoring;

pub use cancel::CancellationToken;
pub use config::{AuditConfiguration, AuditPolicy};
pub use corrective::{
    ActionCategory, CorrectiveAction, CorrectivePlan, CorrectivePlanGenerator, EscalationLevel, ResponsibleParty,
};
pub use error::AuditError;
pub use fraud::{
    FraudAssessment, FraudDetector, FraudIndicator, FraudInput, FraudPattern, FraudResponse, FraudRiskLevel,
};
pub use i18n::{Locale, LocalizationError, Localizer};
pub use orchestrator::{AuditOrchestrator, AuditOrchestratorBuilder};
pub use outcome::{AuditOutcome, OutcomeClassifier};
pub use population::{PopulationSummary, PopulationView};
pub use ports::HistoryStore;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockHistoryStore;
pub use report::{AuditReport, FindingBreakdown};
pub use risk::{RiskFactor, RiskLevel, RiskProfile, RiskProfiler};
pub use run::{AuditRun, AuditRunSummary, UnauditableClaim};
pub use sampling::{AuditSample, SampledClaim, Sampler, Stratum};
pub use scoring::ComplianceScorer;
