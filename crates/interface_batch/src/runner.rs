//! Batch audit execution
//!
//! Wires the JSON adapters to an [`AuditOrchestrator`], runs one audit and
//! hands back the report.

use std::sync::Arc;

use core_kernel::Clock;
use domain_audit::{AuditConfiguration, AuditOrchestrator, AuditReport, CancellationToken};
use domain_rules::CodeCatalog;

use crate::config::RunnerConfig;
use crate::error::BatchError;
use crate::files::{read_json, write_json, JsonClaimSource, JsonDocumentationSource, JsonHistoryStore};

/// Runs a single audit from files
pub struct BatchRunner {
    config: RunnerConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner").field("config", &self.config).finish()
    }
}

impl BatchRunner {
    /// Creates a runner; the clock is pinned when the config sets `run_date`
    pub fn new(config: RunnerConfig) -> Self {
        if let Some(run_date) = config.run_date {
            tracing::info!(%run_date, "Run date pinned");
        }
        let clock = config.clock();
        Self { config, clock }
    }

    /// Replaces the wall clock, e.g. to reproduce a past run
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Loads the inputs, runs the audit and writes the outputs
    ///
    /// The report goes to `output_path` when set. When `record_history` is
    /// on, the run summary is appended to the history file. A cancelled or
    /// failed run writes nothing.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<AuditReport, BatchError> {
        let request: AuditConfiguration = read_json(&self.config.request_path).await?;
        let orchestrator = self.orchestrator().await?;

        let run = orchestrator.run_sealed(request, cancel).await?;
        let report = AuditReport::from_run(&run)?;

        if let Some(path) = &self.config.output_path {
            write_json(path, &report, "audit report").await?;
            tracing::info!(path = %path.display(), run_id = %report.run_id, "Report written");
        }

        if self.config.record_history {
            match &self.config.history_path {
                Some(path) => {
                    JsonHistoryStore::record(path, run.summary()).await?;
                    tracing::info!(path = %path.display(), run_id = %run.id, "Run recorded in history");
                }
                None => tracing::warn!("record_history is set without a history path, run not recorded"),
            }
        }

        Ok(report)
    }

    async fn orchestrator(&self) -> Result<AuditOrchestrator, BatchError> {
        let claims = JsonClaimSource::load(&self.config.claims_path).await?;
        let documents = match &self.config.documents_path {
            Some(path) => JsonDocumentationSource::load(path).await?,
            None => {
                tracing::warn!("No documentation export configured, every referenced record will be missing");
                JsonDocumentationSource::default()
            }
        };
        let history = match &self.config.history_path {
            Some(path) => JsonHistoryStore::load(path).await?,
            None => JsonHistoryStore::default(),
        };

        tracing::info!(
            claims = claims.len(),
            documents = documents.len(),
            past_runs = history.runs().len(),
            "Inputs loaded"
        );

        let mut builder = AuditOrchestrator::builder(Arc::new(claims), Arc::new(documents), Arc::new(history))
            .clock(Arc::clone(&self.clock))
            .policy(self.config.policy());
        if let Some(path) = &self.config.catalog_path {
            builder = builder.catalog(Arc::new(CodeCatalog::load_from_file(path)?));
        }
        Ok(builder.build()?)
    }
}
