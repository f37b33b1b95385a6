//! Tracing and logging setup.
//!
//! Installs a `tracing_subscriber` registry with an environment filter and
//! either a pretty (development) or JSON (everything else) formatting layer.
//! Metrics are recorded through the `metrics` facade; installing an exporter is
//! left to the embedding application.

use anyhow::Result;
use tracing_subscriber::prelude::*;

pub use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("batch_match={}", config.log_level.to_lowercase()).parse()?);

    if config.use_pretty_format() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Record the outcome of one scored candidate
pub fn record_candidate_outcome(outcome: &'static str) {
    metrics::counter!("batch_match_candidates_total", "outcome" => outcome).increment(1);
}

/// Record how long one matching call took
pub fn record_session_duration(policy: &'static str, duration: std::time::Duration) {
    metrics::histogram!("batch_match_session_duration_seconds", "policy" => policy)
        .record(duration.as_secs_f64());
}
