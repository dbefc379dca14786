//! JSON File Adapters
//!
//! Implements the claim, documentation and history ports over JSON
//! exports, so a run can be reproduced from files alone.
//!
//! # File formats
//!
//! - claims: an array of `Claim`, possibly spanning several providers
//!   (claims of other providers feed the shared-patient check)
//! - documents: an array of `ClinicalDocument`
//! - history: an array of `AuditRunSummary`
//!
//! Files are read once at load time. Lookups never fail except with
//! `PortError::NotFound`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use core_kernel::{AuditPeriod, DomainPort, OperationMetadata, PatientId, PortError, ProviderId};
use domain_audit::{AuditRunSummary, HistoryStore};
use domain_claims::{Claim, ClaimSource, ClinicalDocument, DocumentationSource};

use crate::error::BatchError;

/// Reads and deserializes a JSON file
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, BatchError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BatchError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| BatchError::parse(path, e))
}

/// Serializes a value as pretty JSON and writes it to a file
pub async fn write_json<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<(), BatchError> {
    let body = serde_json::to_string_pretty(value).map_err(|source| BatchError::Serialize { what, source })?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| BatchError::io(path, e))
}

/// Claim source backed by a JSON export
#[derive(Debug, Default)]
pub struct JsonClaimSource {
    claims: Vec<Claim>,
}

impl JsonClaimSource {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    pub async fn load(path: &Path) -> Result<Self, BatchError> {
        let claims: Vec<Claim> = read_json(path).await?;
        tracing::debug!(path = %path.display(), claims = claims.len(), "Loaded claim export");
        Ok(Self::new(claims))
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl DomainPort for JsonClaimSource {}

#[async_trait]
impl ClaimSource for JsonClaimSource {
    async fn fetch(
        &self,
        provider_id: &ProviderId,
        period: &AuditPeriod,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Claim>, PortError> {
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
        let wanted: HashSet<&PatientId> = patient_ids.iter().collect();
        Ok(self
            .claims
            .iter()
            .filter(|c| wanted.contains(&c.patient_id) && period.contains(c.service_start))
            .cloned()
            .collect())
    }
}

/// Documentation source backed by a JSON export
#[derive(Debug, Default)]
pub struct JsonDocumentationSource {
    documents: HashMap<String, ClinicalDocument>,
}

impl JsonDocumentationSource {
    /// Indexes records by reference; a later duplicate replaces an earlier one
    pub fn new(documents: Vec<ClinicalDocument>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|d| (d.reference.clone(), d))
                .collect(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self, BatchError> {
        let documents: Vec<ClinicalDocument> = read_json(path).await?;
        tracing::debug!(path = %path.display(), documents = documents.len(), "Loaded documentation export");
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DomainPort for JsonDocumentationSource {}

#[async_trait]
impl DocumentationSource for JsonDocumentationSource {
    async fn fetch(
        &self,
        reference: &str,
        _metadata: Option<OperationMetadata>,
    ) -> Result<ClinicalDocument, PortError> {
        self.documents
            .get(reference)
            .cloned()
            .ok_or_else(|| PortError::not_found("ClinicalDocument", reference))
    }
}

/// History store backed by a JSON file of run summaries
#[derive(Debug, Default)]
pub struct JsonHistoryStore {
    runs: Vec<AuditRunSummary>,
}

impl JsonHistoryStore {
    pub fn new(runs: Vec<AuditRunSummary>) -> Self {
        Self { runs }
    }

    /// Loads the history file; a file that does not exist yet is an empty history
    pub async fn load(path: &Path) -> Result<Self, BatchError> {
        match tokio::fs::try_exists(path).await {
            Ok(false) => {
                tracing::info!(path = %path.display(), "No audit history file, starting empty");
                Ok(Self::default())
            }
            _ => Ok(Self::new(read_json(path).await?)),
        }
    }

    /// Appends a run summary and rewrites the file
    ///
    /// A summary for a run id already present replaces the stored one.
    pub async fn record(path: &Path, summary: AuditRunSummary) -> Result<(), BatchError> {
        let mut store = Self::load(path).await?;
        store.runs.retain(|r| r.run_id != summary.run_id);
        store.runs.push(summary);
        write_json(path, &store.runs, "audit history").await
    }

    pub fn runs(&self) -> &[AuditRunSummary] {
        &self.runs
    }
}

impl DomainPort for JsonHistoryStore {}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn past_runs(
        &self,
        provider_id: &ProviderId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<AuditRunSummary>, PortError> {
        Ok(self
            .runs
            .iter()
            .filter(|r| &r.provider_id == provider_id)
            .cloned()
            .collect())
    }
}
