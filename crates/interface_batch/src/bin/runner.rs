//! Provider Audit Engine - Batch Runner Binary
//!
//! Runs one provider compliance audit from JSON files and writes the
//! bilingual audit report.
//!
//! # Usage
//!
//! ```bash
//! # Request and claims as arguments, report on stdout
//! audit-runner request.json claims.json
//!
//! # Everything from the environment, report to a file
//! AUDIT_REQUEST_PATH=request.json AUDIT_CLAIMS_PATH=claims.json \
//! AUDIT_DOCUMENTS_PATH=documents.json AUDIT_OUTPUT_PATH=report.json audit-runner
//! ```
//!
//! # Environment Variables
//!
//! * `AUDIT_REQUEST_PATH` - Audit request JSON (default: audit_request.json)
//! * `AUDIT_CLAIMS_PATH` - Claim export JSON (default: claims.json)
//! * `AUDIT_DOCUMENTS_PATH` - Clinical record export JSON
//! * `AUDIT_HISTORY_PATH` - Past run summaries JSON
//! * `AUDIT_RECORD_HISTORY` - Append this run to the history file (default: false)
//! * `AUDIT_RUN_DATE` - Pins the run date, RFC 3339 (default: wall clock)
//! * `AUDIT_CATALOG_PATH` - Code catalog replacing the bundled one
//! * `AUDIT_OUTPUT_PATH` - Report destination (default: stdout)
//! * `AUDIT_MAX_CONCURRENCY` - Claims evaluated concurrently (default: 8)
//! * `AUDIT_MAX_RETRIES` - Retries per external call (default: 3)
//! * `AUDIT_CALL_TIMEOUT_MS` - Timeout per external call (default: 10000)
//! * `AUDIT_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `AUDIT_LOG_FORMAT` - text or json (default: text)
//!
//! # Exit Codes
//!
//! * `0` - Report produced
//! * `1` - Input or output failure
//! * `2` - Invalid configuration or request
//! * `3` - The audit could not complete

use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_audit::CancellationToken;
use interface_batch::{BatchError, BatchRunner, LogFormat, RunnerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match RunnerConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("audit-runner: {}", err);
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    init_tracing(&config.log_level, config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{:#}", err), "Audit run failed");
            let code = err.downcast_ref::<BatchError>().map(BatchError::exit_code).unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(config: RunnerConfig) -> anyhow::Result<()> {
    tracing::info!(
        request = %config.request_path.display(),
        claims = %config.claims_path.display(),
        max_concurrency = config.max_concurrency,
        "Starting provider audit"
    );

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let runner = BatchRunner::new(config);
    let result = runner.execute(&cancel).await;
    watcher.abort();
    let report = result?;

    tracing::info!(
        run_id = %report.run_id,
        provider_id = %report.provider_id,
        score = report.compliance_score,
        outcome = %report.audit_outcome,
        "Audit complete"
    );

    if runner.config().output_path.is_none() {
        let body = report.to_json().context("serializing audit report")?;
        println!("{}", body);
    }
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so a report on stdout stays parseable.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Cancels the run on Ctrl+C or SIGTERM.
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!("Shutdown signal received, cancelling audit run");
    cancel.cancel();
}
