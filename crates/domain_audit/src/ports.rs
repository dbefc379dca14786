//! Audit Domain Ports

use async_trait::async_trait;

use core_kernel::{DomainPort, OperationMetadata, PortError, ProviderId};

use crate::run::AuditRunSummary;

/// Read access to completed audit runs
#[async_trait]
pub trait HistoryStore: DomainPort {
    /// Returns every recorded run for the provider, in any order
    async fn past_runs(
        &self,
        provider_id: &ProviderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<AuditRunSummary>, PortError>;
}

/// In-memory mock implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;

    /// In-memory history store
    #[derive(Debug, Default)]
    pub struct MockHistoryStore {
        runs: Vec<AuditRunSummary>,
        failing: bool,
    }

    impl MockHistoryStore {
        pub fn new(runs: Vec<AuditRunSummary>) -> Self {
            Self { runs, failing: false }
        }

        /// A store whose every read fails
        pub fn failing() -> Self {
            Self {
                runs: Vec::new(),
                failing: true,
            }
        }
    }

    impl DomainPort for MockHistoryStore {}

    #[async_trait]
    impl HistoryStore for MockHistoryStore {
        async fn past_runs(
            &self,
            provider_id: &ProviderId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<AuditRunSummary>, PortError> {
            if self.failing {
                return Err(PortError::unavailable("audit history"));
            }
            Ok(self
                .runs
                .iter()
                .filter(|r| &r.provider_id == provider_id)
                .cloned()
                .collect())
        }
    }
}
