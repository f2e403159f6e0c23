//! Tracing and telemetry instrumentation for cloudjobs.
//!
//! This module provides helper functions for creating tracing spans and
//! recording outcomes of remote calls made during a lifecycle run. All
//! functions work both with and without the `metrics` feature flag.
//!
//! # Example
//!
//! ```ignore
//! use cloudjobs::telemetry::{launch_span, record_launch};
//!
//! let span = launch_span(job.as_str(), "wait_until_done");
//! let _enter = span.enter();
//! record_launch(job.as_str(), "wait_until_done", "completed");
//! ```

use std::future::Future;
use tracing::{Instrument, Span, info_span};
use tracing_subscriber::EnvFilter;

/// Install the process-wide `fmt` subscriber used by the binaries.
///
/// Honours `RUST_LOG`, defaulting to `info`. Calling it again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Set up process telemetry for a binary: the tracing subscriber and, with
/// the `metrics` feature, the Prometheus counters.
pub fn init() -> anyhow::Result<()> {
    init_tracing();
    #[cfg(feature = "metrics")]
    crate::metrics::init_metrics()?;
    Ok(())
}

/// Counters recorded so far in Prometheus text format, or `None` when built
/// without the `metrics` feature.
pub fn metrics_text() -> anyhow::Result<Option<String>> {
    #[cfg(feature = "metrics")]
    {
        crate::metrics::gather_metrics().map(Some)
    }
    #[cfg(not(feature = "metrics"))]
    {
        Ok(None)
    }
}

/// Create a tracing span for a whole orchestrator run.
#[must_use]
pub fn run_span(workflow: impl AsRef<str>, scope: impl AsRef<str>) -> Span {
    info_span!(
        "cloudjobs.run",
        workflow = %workflow.as_ref(),
        scope = %scope.as_ref(),
    )
}

/// Create a tracing span for a launch request.
///
/// # Arguments
/// * `job` - The job resource name
/// * `mode` - The launch mode label
#[must_use]
pub fn launch_span(job: impl AsRef<str>, mode: impl AsRef<str>) -> Span {
    info_span!(
        "cloudjobs.launch",
        job = %job.as_ref(),
        mode = %mode.as_ref(),
    )
}

#[must_use]
pub fn cancel_span(execution: impl AsRef<str>) -> Span {
    info_span!("cloudjobs.cancel", execution = %execution.as_ref())
}

/// Create a tracing span for a paginated listing.
///
/// # Arguments
/// * `listing` - What is being listed (`jobs`, `executions`)
/// * `parent` - The scope or job the listing runs under
#[must_use]
pub fn list_span(listing: impl AsRef<str>, parent: impl AsRef<str>) -> Span {
    info_span!(
        "cloudjobs.list",
        listing = %listing.as_ref(),
        parent = %parent.as_ref(),
    )
}

/// Instrument a future with a launch span.
pub fn instrument_launch<F>(
    job: impl AsRef<str>,
    mode: impl AsRef<str>,
    future: F,
) -> impl Future<Output = F::Output>
where
    F: Future,
{
    future.instrument(launch_span(job, mode))
}

/// Record the outcome of a launch.
///
/// # Arguments
/// * `job` - The job resource name
/// * `mode` - The launch mode label
/// * `outcome` - `accepted`, `completed` or `failed`
pub fn record_launch(job: impl AsRef<str>, mode: impl AsRef<str>, outcome: impl AsRef<str>) {
    tracing::info!(
        job = %job.as_ref(),
        mode = %mode.as_ref(),
        outcome = %outcome.as_ref(),
        "launch finished"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_launch(mode.as_ref(), outcome.as_ref());
}

/// Record the outcome of a cancellation request.
pub fn record_cancellation(execution: impl AsRef<str>, outcome: impl AsRef<str>) {
    tracing::info!(
        execution = %execution.as_ref(),
        outcome = %outcome.as_ref(),
        "cancellation finished"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_cancellation(outcome.as_ref());
}

/// Record a listing that was aborted by a failed page read.
pub fn record_listing_failure(
    listing: impl AsRef<str>,
    parent: impl AsRef<str>,
    error: impl std::fmt::Display,
) {
    tracing::error!(
        listing = %listing.as_ref(),
        parent = %parent.as_ref(),
        error = %error,
        "listing failed, returning empty result"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_listing_failure(listing.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_span() {
        let span = launch_span("job-A", "fire_and_forget");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "cloudjobs.launch");
        }
    }

    #[test]
    fn test_recorders_do_not_panic() {
        record_launch("job-A", "wait_until_done", "completed");
        record_cancellation("exec-1", "requested");
        record_listing_failure("jobs", "projects/p/locations/r", "boom");
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_init_registers_counters_for_binaries() {
        init().expect("telemetry initialization should succeed");
        record_launch("job-A", "fire_and_forget", "accepted");

        let text = metrics_text()
            .expect("gather should succeed")
            .expect("metrics enabled");
        assert!(text.contains("cloudjobs_launches_total"));
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_metrics_text_is_absent_without_feature() {
        init().expect("telemetry initialization should succeed");
        assert!(metrics_text().expect("no metrics to gather").is_none());
    }

    #[tokio::test]
    async fn test_instrument_launch_passes_output_through() {
        let value = instrument_launch("job-A", "wait_until_done", async { 7 }).await;
        assert_eq!(value, 7);
    }
}
