//! Batch Invocation Layer
//!
//! Runs provider compliance audits from JSON files. This crate holds the
//! file-backed port adapters, the runner configuration and the
//! `audit-runner` binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_batch::{BatchRunner, RunnerConfig};
//! use domain_audit::CancellationToken;
//!
//! let runner = BatchRunner::new(RunnerConfig::from_env()?);
//! let report = runner.execute(&CancellationToken::new()).await?;
//! println!("{}", report.to_json()?);
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod runner;

pub use config::{LogFormat, RunnerConfig};
pub use error::BatchError;
pub use files::{JsonClaimSource, JsonDocumentationSource, JsonHistoryStore};
pub use runner::BatchRunner;
