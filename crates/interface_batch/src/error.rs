//! Batch runner error handling

use std::path::PathBuf;

use thiserror::Error;

use domain_audit::AuditError;
use domain_rules::CatalogError;

/// Batch runner error types
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid runner configuration: {0}")]
    Validation(String),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl BatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BatchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        BatchError::Parse {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error
    ///
    /// 2 for rejected requests, 3 for runs that could not complete, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchError::Config(_) | BatchError::Validation(_) => 2,
            BatchError::Audit(err) if err.is_configuration_error() => 2,
            BatchError::Audit(_) => 3,
            _ => 1,
        }
    }
}

impl From<validator::ValidationErrors> for BatchError {
    fn from(err: validator::ValidationErrors) -> Self {
        BatchError::Validation(err.to_string())
    }
}
