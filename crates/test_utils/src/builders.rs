//! Test Data Builders
//!
//! Builder patterns for claims, audit requests and fully wired
//! orchestrators backed by the in-memory ports.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AuditPeriod, FixedClock, RetryPolicy};
use domain_audit::{AuditConfiguration, AuditOrchestrator, AuditPolicy, AuditRunSummary, MockHistoryStore};
use domain_claims::{Claim, ClinicalDocument, MockClaimSource, MockDocumentationSource};

use crate::fixtures::{IdFixtures, TemporalFixtures, PROVIDER};

/// Builder for constructing test claims
///
/// Defaults to a clean outpatient visit for the standard provider, with its
/// own patient and a documentation reference.
#[derive(Debug, Clone)]
pub struct TestClaimBuilder {
    claim: Claim,
}

impl TestClaimBuilder {
    /// Creates a builder for the n-th claim of a population
    pub fn new(n: usize) -> Self {
        Self {
            claim: Claim {
                id: IdFixtures::claim(n),
                provider_id: IdFixtures::provider(),
                patient_id: IdFixtures::patient(n),
                amount: dec!(280),
                service_code: "99213".to_string(),
                diagnosis_codes: vec!["J06.9".to_string()],
                documentation_ref: Some(IdFixtures::document_ref(n)),
                service_start: TemporalFixtures::clinic_hours(0),
                service_end: None,
                service_category: Some("outpatient".to_string()),
            },
        }
    }

    pub fn with_code(mut self, code: &str, category: &str) -> Self {
        self.claim.service_code = code.to_string();
        self.claim.service_category = Some(category.to_string());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.claim.amount = amount;
        self
    }

    pub fn with_diagnoses(mut self, diagnoses: &[&str]) -> Self {
        self.claim.diagnosis_codes = diagnoses.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_patient(mut self, n: usize) -> Self {
        self.claim.patient_id = IdFixtures::patient(n);
        self
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.claim.provider_id = provider.into();
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.claim.service_start = start;
        self
    }

    /// Sets a service window of the given length
    pub fn lasting(mut self, minutes: i64) -> Self {
        self.claim.service_end = Some(self.claim.service_start + Duration::minutes(minutes));
        self
    }

    pub fn without_documentation(mut self) -> Self {
        self.claim.documentation_ref = None;
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}

/// Builder for audit requests
#[derive(Debug, Clone)]
pub struct AuditConfigurationBuilder {
    config: AuditConfiguration,
}

impl Default for AuditConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditConfigurationBuilder {
    /// A risk-based request for 100 claims of the standard provider
    pub fn new() -> Self {
        Self {
            config: AuditConfiguration {
                provider_id: PROVIDER.to_string(),
                audit_period: TemporalFixtures::h1_2024(),
                sample_size: 100,
                risk_based_sampling: true,
                focus_areas: vec![],
                region: "Riyadh".to_string(),
                rule_version: "2.0".to_string(),
                random_seed: 42,
            },
        }
    }

    pub fn sample_size(mut self, size: u32) -> Self {
        self.config.sample_size = size;
        self
    }

    pub fn focus_areas(mut self, areas: &[&str]) -> Self {
        self.config.focus_areas = areas.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn risk_based(mut self, enabled: bool) -> Self {
        self.config.risk_based_sampling = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    pub fn rule_version(mut self, version: &str) -> Self {
        self.config.rule_version = version.to_string();
        self
    }

    pub fn provider(mut self, provider: &str) -> Self {
        self.config.provider_id = provider.to_string();
        self
    }

    pub fn period(mut self, period: AuditPeriod) -> Self {
        self.config.audit_period = period;
        self
    }

    pub fn build(self) -> AuditConfiguration {
        self.config
    }
}

/// Wires an orchestrator to in-memory ports
///
/// Uses a fixed clock and a retry policy without delays.
pub struct TestOrchestratorBuilder {
    claims: Arc<MockClaimSource>,
    documents: Arc<MockDocumentationSource>,
    history: Vec<AuditRunSummary>,
    failing_history: bool,
    policy: AuditPolicy,
}

impl TestOrchestratorBuilder {
    /// Serves the claims and a complete record for every referenced claim
    pub fn with_claims(claims: Vec<Claim>) -> Self {
        let documents = crate::fixtures::DocumentFixtures::for_claims(&claims);
        Self {
            claims: Arc::new(MockClaimSource::new(claims)),
            documents: Arc::new(MockDocumentationSource::new(documents)),
            history: Vec::new(),
            failing_history: false,
            policy: AuditPolicy::default().with_retry(RetryPolicy::immediate(2)),
        }
    }

    pub fn claim_source(mut self, source: MockClaimSource) -> Self {
        self.claims = Arc::new(source);
        self
    }

    pub fn documents(mut self, documents: Vec<ClinicalDocument>) -> Self {
        self.documents = Arc::new(MockDocumentationSource::new(documents));
        self
    }

    pub fn documentation_source(mut self, source: MockDocumentationSource) -> Self {
        self.documents = Arc::new(source);
        self
    }

    pub fn history(mut self, runs: Vec<AuditRunSummary>) -> Self {
        self.history = runs;
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.failing_history = true;
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.policy = self.policy.with_max_concurrency(n);
        self
    }

    /// Shared handle to the documentation mock, for call-count assertions
    pub fn documentation_handle(&self) -> Arc<MockDocumentationSource> {
        Arc::clone(&self.documents)
    }

    pub fn build(self) -> AuditOrchestrator {
        let history = if self.failing_history {
            MockHistoryStore::failing()
        } else {
            MockHistoryStore::new(self.history)
        };
        AuditOrchestrator::builder(self.claims, self.documents, Arc::new(history))
            .clock(Arc::new(FixedClock(TemporalFixtures::run_date())))
            .policy(self.policy)
            .build()
            .expect("standard catalog loads")
    }
}
