//! Claims Domain Ports
//!
//! The audit engine never reads claims or clinical records directly. It
//! consumes them through these ports so that the same engine runs against a
//! payer's claims warehouse, a file export, or an in-memory mock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_claims::ports::ClaimSource;
//! use std::sync::Arc;
//!
//! let source: Arc<dyn ClaimSource> = Arc::new(MockClaimSource::new(claims));
//! let population = source.fetch(&provider_id, &period, None).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{AuditPeriod, DomainPort, OperationMetadata, PatientId, PortError, ProviderId};

use crate::claim::Claim;
use crate::documentation::ClinicalDocument;

/// Supplies the claim population for a provider and period
#[async_trait]
pub trait ClaimSource: DomainPort {
    /// Fetches every claim the provider submitted with a service start inside the period
    ///
    /// # Arguments
    ///
    /// * `provider_id` - The audited provider
    /// * `period` - The audit period
    /// * `metadata` - Optional operation metadata for tracing
    async fn fetch(
        &self,
        provider_id: &ProviderId,
        period: &AuditPeriod,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, PortError>;

    /// Fetches claims any provider submitted for the given patients
    ///
    /// Used by the shared-patient check. Sources without a cross-provider
    /// view return an empty list.
    async fn fetch_patient_claims(
        &self,
        _patient_ids: &[PatientId],
        _period: &AuditPeriod,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, PortError> {
        Ok(Vec::new())
    }
}

/// Supplies the clinical record behind a claim
#[async_trait]
pub trait DocumentationSource: DomainPort {
    /// Fetches a clinical record by reference
    ///
    /// Returns `PortError::NotFound` when the reference does not resolve.
    async fn fetch(
        &self,
        reference: &str,
        metadata: Option<OperationMetadata>,
    ) -> Result<ClinicalDocument, PortError>;
}

/// In-memory mock implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Failure a mock source should simulate
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SourceFailure {
        /// Fails with a transient connection error
        Transient,
        /// Fails with a non-retryable internal error
        Permanent,
    }

    impl SourceFailure {
        fn to_error(self, what: &str) -> PortError {
            tracing::debug!(failure = ?self, source = what, "Mock source failing on request");
            match self {
                SourceFailure::Transient => PortError::connection(format!("{} unreachable", what)),
                SourceFailure::Permanent => PortError::internal(format!("{} corrupted", what)),
            }
        }
    }

    /// In-memory claim source
    #[derive(Debug, Default)]
    pub struct MockClaimSource {
        claims: Vec<Claim>,
        cross_provider: Vec<Claim>,
        failure: Option<SourceFailure>,
        calls: AtomicU32,
    }

    impl MockClaimSource {
        /// Creates a source serving the given claims
        pub fn new(claims: Vec<Claim>) -> Self {
            Self {
                claims,
                ..Default::default()
            }
        }

        /// Adds claims from other providers, visible to the shared-patient lookup
        pub fn with_cross_provider_claims(mut self, claims: Vec<Claim>) -> Self {
            self.cross_provider = claims;
            self
        }

        /// Makes every fetch fail
        pub fn failing(failure: SourceFailure) -> Self {
            Self {
                failure: Some(failure),
                ..Default::default()
            }
        }

        /// Number of fetch calls served or failed
        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockClaimSource {}

    #[async_trait]
    impl ClaimSource for MockClaimSource {
        async fn fetch(
            &self,
            provider_id: &ProviderId,
            period: &AuditPeriod,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Claim>, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = self.failure {
                return Err(failure.to_error("claim warehouse"));
            }
            Ok(self
                .claims
                .iter()
                .filter(|c| &c.provider_id == provider_id && period.contains(c.service_start))
                .cloned()
                .collect())
        }

        async fn fetch_patient_claims(
            &self,
            patient_ids: &[PatientId],
            period: &AuditPeriod,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Claim>, PortError> {
            if let Some(failure) = self.failure {
                return Err(failure.to_error("claim warehouse"));
            }
            Ok(self
                .claims
                .iter()
                .chain(self.cross_provider.iter())
                .filter(|c| patient_ids.contains(&c.patient_id) && period.contains(c.service_start))
                .cloned()
                .collect())
        }
    }

    /// In-memory documentation store with failure injection
    #[derive(Debug, Default)]
    pub struct MockDocumentationSource {
        documents: HashMap<String, ClinicalDocument>,
        failures: Arc<RwLock<HashMap<String, (SourceFailure, Option<u32>)>>>,
        calls: AtomicU32,
    }

    impl MockDocumentationSource {
        /// Creates a store holding the given documents
        pub fn new(documents: Vec<ClinicalDocument>) -> Self {
            Self {
                documents: documents.into_iter().map(|d| (d.reference.clone(), d)).collect(),
                ..Default::default()
            }
        }

        /// Fails every fetch of the reference
        pub async fn fail_always(self, reference: impl Into<String>, failure: SourceFailure) -> Self {
            self.failures.write().await.insert(reference.into(), (failure, None));
            self
        }

        /// Fails the first `times` fetches of the reference, then serves it
        pub async fn fail_times(self, reference: impl Into<String>, failure: SourceFailure, times: u32) -> Self {
            self.failures.write().await.insert(reference.into(), (failure, Some(times)));
            self
        }

        /// Number of fetch calls served or failed
        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockDocumentationSource {}

    #[async_trait]
    impl DocumentationSource for MockDocumentationSource {
        async fn fetch(
            &self,
            reference: &str,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ClinicalDocument, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            {
                let mut failures = self.failures.write().await;
                if let Some((failure, remaining)) = failures.get_mut(reference) {
                    match remaining {
                        None => return Err(failure.to_error("documentation store")),
                        Some(0) => {}
                        Some(n) => {
                            *n -= 1;
                            return Err(failure.to_error("documentation store"));
                        }
                    }
                }
            }
            self.documents
                .get(reference)
                .cloned()
                .ok_or_else(|| PortError::not_found("ClinicalDocument", reference))
        }
    }
}
