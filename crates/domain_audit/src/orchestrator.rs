//! Audit Run Orchestration
//!
//! Drives one audit from request to sealed run:
//!
//! ```text
//! validate ─> fetch population ─> history ─> risk profile ─> sample
//!                                                              │
//!        ┌───────────── bounded worker pool ───────────────────┘
//!        │  fetch documentation (timeout + retry) ─> rule engine
//!        └──> join, sort by claim id
//!                 │
//!   fraud ─> score ─> outcome ─> corrective plan ─> sealed AuditRun ─> report
//! ```
//!
//! Sampling happens once, before fan-out. Workers share only read-only data
//! and results are sorted before any aggregation, so the concurrency limit
//! never changes the outcome of a run.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use core_kernel::{
    AuditRunId, ClaimId, Clock, CorrectivePlanId, OperationMetadata, PortError, RetryPolicy, SystemClock,
};
use domain_claims::{Claim, ClaimIndex, ClaimSource, DocumentationSource, DocumentationStatus};
use domain_rules::{CaseResult, CodeCatalog, RuleContext, RuleEngine, RuleRegistry};

use crate::cancel::CancellationToken;
use crate::config::{AuditConfiguration, AuditPolicy};
use crate::corrective::CorrectivePlanGenerator;
use crate::error::AuditError;
use crate::fraud::{FraudDetector, FraudInput};
use crate::outcome::OutcomeClassifier;
use crate::population::PopulationView;
use crate::ports::HistoryStore;
use crate::report::AuditReport;
use crate::risk::RiskProfiler;
use crate::run::{AuditRun, UnauditableClaim};
use crate::sampling::Sampler;
use crate::scoring::ComplianceScorer;

/// Runs audits against a fixed set of collaborators
#[derive(Clone)]
pub struct AuditOrchestrator {
    claim_source: Arc<dyn ClaimSource>,
    documentation_source: Arc<dyn DocumentationSource>,
    history_store: Arc<dyn HistoryStore>,
    registry: Arc<RuleRegistry>,
    catalog: Arc<CodeCatalog>,
    clock: Arc<dyn Clock>,
    policy: AuditPolicy,
}

impl std::fmt::Debug for AuditOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditOrchestrator")
            .field("catalog_version", &self.catalog.version())
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`AuditOrchestrator`]
///
/// Registry, catalog and clock default to the standard rule sets, the
/// bundled code catalog and the system clock.
pub struct AuditOrchestratorBuilder {
    claim_source: Arc<dyn ClaimSource>,
    documentation_source: Arc<dyn DocumentationSource>,
    history_store: Arc<dyn HistoryStore>,
    registry: Option<Arc<RuleRegistry>>,
    catalog: Option<Arc<CodeCatalog>>,
    clock: Option<Arc<dyn Clock>>,
    policy: AuditPolicy,
}

impl AuditOrchestratorBuilder {
    pub fn registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn catalog(mut self, catalog: Arc<CodeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<AuditOrchestrator, AuditError> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => CodeCatalog::standard()?,
        };
        Ok(AuditOrchestrator {
            claim_source: self.claim_source,
            documentation_source: self.documentation_source,
            history_store: self.history_store,
            registry: self.registry.unwrap_or_else(|| Arc::new(RuleRegistry::standard())),
            catalog,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            policy: self.policy,
        })
    }
}

/// What a worker produced for one sampled claim
enum CaseOutcome {
    Evaluated(CaseResult),
    Unauditable(UnauditableClaim),
    Cancelled,
}

impl AuditOrchestrator {
    pub fn builder(
        claim_source: Arc<dyn ClaimSource>,
        documentation_source: Arc<dyn DocumentationSource>,
        history_store: Arc<dyn HistoryStore>,
    ) -> AuditOrchestratorBuilder {
        AuditOrchestratorBuilder {
            claim_source,
            documentation_source,
            history_store,
            registry: None,
            catalog: None,
            clock: None,
            policy: AuditPolicy::default(),
        }
    }

    pub fn policy(&self) -> &AuditPolicy {
        &self.policy
    }

    /// Runs an audit and assembles its report
    pub async fn run(&self, config: AuditConfiguration) -> Result<AuditReport, AuditError> {
        let run = self.run_sealed(config, &CancellationToken::new()).await?;
        AuditReport::from_run(&run)
    }

    /// Runs an audit and returns the sealed run
    ///
    /// Returns `AuditError::Cancelled` if the token fires before every case
    /// has been evaluated; outstanding workers are aborted and no run exists.
    pub async fn run_sealed(
        &self,
        config: AuditConfiguration,
        cancel: &CancellationToken,
    ) -> Result<AuditRun, AuditError> {
        config.validate_for(&self.registry)?;
        let engine = Arc::new(RuleEngine::new(self.registry.rules_for(&config.rule_version)?));

        let provider_id = config.provider();
        let run_id = AuditRunId::from_name(&config.run_key());
        let started_at = self.clock.now();
        let metadata = OperationMetadata::with_correlation_id(run_id.to_string())
            .with_context("provider_id", provider_id.as_str());
        info!(
            provider_id = %provider_id,
            run_id = %run_id,
            rule_version = %config.rule_version,
            sample_size = config.sample_size,
            "Starting audit run"
        );
        ensure_active(cancel, run_id)?;

        let mut claims = with_retry(&self.policy.retry, "claim population fetch", || {
            self.claim_source.fetch(&provider_id, &config.audit_period, Some(metadata.clone()))
        })
        .await
        .map_err(|source| AuditError::ClaimSourceUnavailable {
            provider_id: provider_id.to_string(),
            source,
        })?;
        claims.sort_by(|a, b| a.id.cmp(&b.id));
        claims.dedup_by(|a, b| a.id == b.id);
        if claims.is_empty() {
            return Err(AuditError::EmptyPopulation {
                provider_id: provider_id.to_string(),
            });
        }
        info!(provider_id = %provider_id, run_id = %run_id, claims = claims.len(), "Population fetched");

        let history = match with_retry(&self.policy.retry, "audit history fetch", || {
            self.history_store.past_runs(&provider_id, Some(metadata.clone()))
        })
        .await
        {
            Ok(runs) => Some(runs),
            Err(err) => {
                warn!(provider_id = %provider_id, run_id = %run_id, error = %err, "Audit history unavailable, profiling without it");
                None
            }
        };

        let index = Arc::new(ClaimIndex::new(&claims, config.timezone()));
        let population = PopulationView::new(&claims, &index, &self.catalog, self.policy.operating_hours);
        let profile = RiskProfiler.profile(&provider_id, history.as_deref(), &population, &config.region);
        let sample = Sampler::default().sample(&population, &profile, &config);
        info!(
            provider_id = %provider_id,
            run_id = %run_id,
            risk_level = %profile.risk_level,
            sampled = sample.len(),
            "Sample drawn"
        );

        let sampled: Vec<Claim> = sample
            .claim_ids()
            .filter_map(|id| find_claim(&claims, id))
            .cloned()
            .collect();
        let (case_results, unauditable) = self
            .evaluate_sample(sampled, Arc::clone(&engine), Arc::clone(&index), cancel, run_id)
            .await?;
        if case_results.is_empty() {
            return Err(AuditError::NoAuditableClaims {
                provider_id: provider_id.to_string(),
                excluded: unauditable.len(),
            });
        }

        let audited_claims: Vec<Claim> = case_results
            .iter()
            .filter_map(|r| find_claim(&claims, &r.claim_id))
            .cloned()
            .collect();
        let cross_provider = self.cross_provider_claims(&audited_claims, &config, &metadata).await;
        let fraud = FraudDetector.assess(&FraudInput {
            provider_id: &provider_id,
            claims: &audited_claims,
            results: &case_results,
            population: &population,
            cross_provider: &cross_provider,
        });

        let compliance_score = ComplianceScorer
            .score(&case_results)
            .ok_or_else(|| AuditError::NoAuditableClaims {
                provider_id: provider_id.to_string(),
                excluded: unauditable.len(),
            })?;
        let outcome = OutcomeClassifier::new(self.policy.critical_findings_per_case_limit).classify(
            compliance_score,
            &case_results,
            fraud.level,
        );
        let corrective_plan = CorrectivePlanGenerator.generate(
            CorrectivePlanId::from_name(&run_id.to_string()),
            &case_results,
            compliance_score,
            outcome,
            started_at,
        );

        let population_summary = population.summary();
        let run = AuditRun {
            id: run_id,
            provider_id: provider_id.clone(),
            period: config.audit_period.clone(),
            rule_version: config.rule_version.clone(),
            risk_profile: profile,
            sample,
            audited_claims,
            case_results,
            unauditable,
            fraud,
            compliance_score,
            outcome,
            corrective_plan,
            population: population_summary,
            generated_at: self.clock.now(),
        };
        info!(
            provider_id = %provider_id,
            run_id = %run_id,
            compliance_score = run.compliance_score,
            outcome = %run.outcome,
            audited = run.case_results.len(),
            unauditable = run.unauditable.len(),
            "Audit run sealed"
        );
        Ok(run)
    }

    /// Evaluates every sampled claim on the bounded worker pool
    ///
    /// Returns case results and unauditable claims, each ordered by claim id.
    async fn evaluate_sample(
        &self,
        sampled: Vec<Claim>,
        engine: Arc<RuleEngine>,
        index: Arc<ClaimIndex>,
        cancel: &CancellationToken,
        run_id: AuditRunId,
    ) -> Result<(Vec<CaseResult>, Vec<UnauditableClaim>), AuditError> {
        let permits = Arc::new(Semaphore::new(self.policy.max_concurrency.max(1)));
        let mut workers = JoinSet::new();

        for claim in sampled {
            let permits = Arc::clone(&permits);
            let engine = Arc::clone(&engine);
            let index = Arc::clone(&index);
            let catalog = Arc::clone(&self.catalog);
            let documentation_source = Arc::clone(&self.documentation_source);
            let clock = Arc::clone(&self.clock);
            let retry = self.policy.retry.clone();
            let cancel = cancel.clone();

            workers.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return CaseOutcome::Cancelled;
                };
                if cancel.is_cancelled() {
                    return CaseOutcome::Cancelled;
                }
                let documentation = match fetch_documentation(documentation_source.as_ref(), &claim, &retry, run_id).await {
                    Ok(status) => status,
                    Err(err) => {
                        warn!(run_id = %run_id, claim_id = %claim.id, error = %err, "Documentation unavailable, claim unauditable");
                        return CaseOutcome::Unauditable(UnauditableClaim {
                            claim_id: claim.id.clone(),
                            reason: err.to_string(),
                        });
                    }
                };
                if cancel.is_cancelled() {
                    return CaseOutcome::Cancelled;
                }
                let ctx = RuleContext::new(&catalog, &documentation, &index);
                CaseOutcome::Evaluated(engine.evaluate(&claim, &ctx, clock.now()))
            });
        }

        let mut results = Vec::new();
        let mut unauditable = Vec::new();
        while let Some(joined) = workers.join_next().await {
            if cancel.is_cancelled() {
                workers.abort_all();
                warn!(run_id = %run_id, "Audit run cancelled");
                return Err(AuditError::Cancelled {
                    run_id: run_id.to_string(),
                });
            }
            match joined {
                Ok(CaseOutcome::Evaluated(result)) => results.push(result),
                Ok(CaseOutcome::Unauditable(claim)) => unauditable.push(claim),
                Ok(CaseOutcome::Cancelled) => {
                    workers.abort_all();
                    return Err(AuditError::Cancelled {
                        run_id: run_id.to_string(),
                    });
                }
                Err(err) => {
                    workers.abort_all();
                    return Err(AuditError::Worker(err.to_string()));
                }
            }
        }

        results.sort_by(|a, b| a.claim_id.cmp(&b.claim_id));
        unauditable.sort_by(|a, b| a.claim_id.cmp(&b.claim_id));
        debug!(run_id = %run_id, evaluated = results.len(), unauditable = unauditable.len(), "Sample evaluated");
        Ok((results, unauditable))
    }

    /// Claims any provider billed for the audited patients
    ///
    /// An unreadable cross-provider view disables the shared-patient check
    /// rather than failing the run.
    async fn cross_provider_claims(
        &self,
        audited: &[Claim],
        config: &AuditConfiguration,
        metadata: &OperationMetadata,
    ) -> Vec<Claim> {
        let mut patients: Vec<_> = audited.iter().map(|c| c.patient_id.clone()).collect();
        patients.sort();
        patients.dedup();

        match with_retry(&self.policy.retry, "cross-provider claim fetch", || {
            self.claim_source
                .fetch_patient_claims(&patients, &config.audit_period, Some(metadata.clone()))
        })
        .await
        {
            Ok(claims) => claims,
            Err(err) => {
                warn!(provider_id = %config.provider_id, error = %err, "Cross-provider claims unavailable");
                Vec::new()
            }
        }
    }
}

fn ensure_active(cancel: &CancellationToken, run_id: AuditRunId) -> Result<(), AuditError> {
    if cancel.is_cancelled() {
        return Err(AuditError::Cancelled {
            run_id: run_id.to_string(),
        });
    }
    Ok(())
}

fn find_claim<'a>(claims: &'a [Claim], id: &ClaimId) -> Option<&'a Claim> {
    claims
        .binary_search_by(|c| c.id.cmp(id))
        .ok()
        .map(|i| &claims[i])
}

/// Fetches a claim's documentation
///
/// A reference that does not resolve is a documentation finding, not a
/// fetch failure.
async fn fetch_documentation(
    source: &dyn DocumentationSource,
    claim: &Claim,
    retry: &RetryPolicy,
    run_id: AuditRunId,
) -> Result<DocumentationStatus, PortError> {
    let Some(reference) = claim.documentation_ref.as_deref().filter(|r| !r.trim().is_empty()) else {
        return Ok(DocumentationStatus::NotReferenced);
    };
    let metadata = OperationMetadata::with_correlation_id(run_id.to_string())
        .with_context("claim_id", claim.id.as_str());

    match with_retry(retry, "documentation fetch", || source.fetch(reference, Some(metadata.clone()))).await {
        Ok(document) => Ok(DocumentationStatus::Attached(document)),
        Err(err) if err.is_not_found() => Ok(DocumentationStatus::Missing {
            reference: reference.to_string(),
        }),
        Err(err) => Err(err),
    }
}

/// Calls an external collaborator with a per-call timeout, retrying transient failures
async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T, PortError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortError>>,
{
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(policy.call_timeout(), call()).await {
            Ok(result) => result,
            Err(_) => Err(PortError::timeout(operation, policy.call_timeout())),
        };
        match result {
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                let delay = policy.delay_for(attempt);
                warn!(operation, attempt, error = %err, delay_ms = delay.as_millis() as u64, "Transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryPolicy::immediate(3), "probe", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PortError::connection("down"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PortError> = with_retry(&RetryPolicy::immediate(2), "probe", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PortError::connection("down")) }
        })
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), PortError> = with_retry(&RetryPolicy::immediate(5), "probe", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PortError::not_found("ClinicalDocument", "DOC-1")) }
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
