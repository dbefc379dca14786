//! Runner configuration

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use core_kernel::{Clock, FixedClock, RetryPolicy, SystemClock};
use domain_audit::AuditPolicy;

use crate::error::BatchError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Runner configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct RunnerConfig {
    /// Audit request (an `AuditConfiguration` document)
    pub request_path: PathBuf,
    /// Claim population, a JSON array of claims
    pub claims_path: PathBuf,
    /// Clinical records, a JSON array; every reference is missing when unset
    pub documents_path: Option<PathBuf>,
    /// Past run summaries; a missing file means no history
    pub history_path: Option<PathBuf>,
    /// Code catalog replacing the bundled one
    pub catalog_path: Option<PathBuf>,
    /// Report destination; stdout when unset
    pub output_path: Option<PathBuf>,
    /// Append the run summary to the history file
    pub record_history: bool,
    /// Pins the run date (RFC 3339); the wall clock when unset
    pub run_date: Option<DateTime<Utc>>,
    /// Log level
    pub log_level: String,
    /// Log format
    pub log_format: LogFormat,
    /// Claims evaluated concurrently
    #[validate(range(min = 1, max = 256, message = "max_concurrency must be between 1 and 256"))]
    pub max_concurrency: usize,
    /// Retries per external call
    #[validate(range(max = 10, message = "max_retries must be at most 10"))]
    pub max_retries: u32,
    /// Timeout for a single external call in milliseconds
    #[validate(range(min = 1, message = "call_timeout_ms must be positive"))]
    pub call_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            request_path: PathBuf::from("audit_request.json"),
            claims_path: PathBuf::from("claims.json"),
            documents_path: None,
            history_path: None,
            catalog_path: None,
            output_path: None,
            record_history: false,
            run_date: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_concurrency: 8,
            max_retries: 3,
            call_timeout_ms: 10_000,
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from `AUDIT_`-prefixed environment variables
    pub fn from_env() -> Result<Self, BatchError> {
        Self::load(&[])
    }

    /// Loads configuration from the environment, letting positional
    /// arguments (request path, claims path, output path) override it
    pub fn load(args: &[String]) -> Result<Self, BatchError> {
        let config: RunnerConfig = config::Config::builder()
            .add_source(config::Environment::with_prefix("AUDIT").try_parsing(true))
            .set_override_option("request_path", args.first().cloned())?
            .set_override_option("claims_path", args.get(1).cloned())?
            .set_override_option("output_path", args.get(2).cloned())?
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Clock for the run: fixed at `run_date` when set
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.run_date {
            Some(instant) => Arc::new(FixedClock(instant)),
            None => Arc::new(SystemClock),
        }
    }

    /// Engine tuning derived from the runner settings
    pub fn policy(&self) -> AuditPolicy {
        let retry = RetryPolicy {
            max_retries: self.max_retries,
            call_timeout_ms: self.call_timeout_ms,
            ..RetryPolicy::default()
        };
        AuditPolicy::default()
            .with_max_concurrency(self.max_concurrency)
            .with_retry(retry)
    }
}
