//! Prometheus metrics instrumentation for cloudjobs.
//!
//! All metrics are conditionally compiled behind the `metrics` feature flag.
//!
//! # Metrics
//!
//! - `cloudjobs_launches_total` - Launch requests by mode and outcome
//! - `cloudjobs_cancellations_total` - Cancellation requests by outcome
//! - `cloudjobs_listing_failures_total` - Listings aborted by a page failure
#![cfg(feature = "metrics")]

use prometheus::{CounterVec, Opts, Registry};
use std::sync::LazyLock;

/// Global Prometheus registry for cloudjobs metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Labels:
/// - `mode`: `fire_and_forget` or `wait_until_done`
/// - `outcome`: `accepted`, `completed` or `failed`
pub static LAUNCHES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new("cloudjobs_launches_total", "Total number of launch requests");
    CounterVec::new(opts, &["mode", "outcome"])
        .expect("cloudjobs_launches_total metric creation failed")
});

/// Labels:
/// - `outcome`: `requested`, `already_gone` or `failed`
pub static CANCELLATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "cloudjobs_cancellations_total",
        "Total number of cancellation requests",
    );
    CounterVec::new(opts, &["outcome"])
        .expect("cloudjobs_cancellations_total metric creation failed")
});

/// Labels:
/// - `listing`: `jobs` or `executions`
pub static LISTING_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "cloudjobs_listing_failures_total",
        "Total number of listings aborted by a failed page read",
    );
    CounterVec::new(opts, &["listing"])
        .expect("cloudjobs_listing_failures_total metric creation failed")
});

/// Register all metrics with the global registry.
///
/// Calling it more than once is safe.
pub fn init_metrics() -> anyhow::Result<()> {
    let registry = &*REGISTRY;

    for metric in [
        Box::new(LAUNCHES_TOTAL.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(CANCELLATIONS_TOTAL.clone()),
        Box::new(LISTING_FAILURES_TOTAL.clone()),
    ] {
        if let Err(e) = registry.register(metric) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

pub fn record_launch(mode: &str, outcome: &str) {
    LAUNCHES_TOTAL.with_label_values(&[mode, outcome]).inc();
}

pub fn record_cancellation(outcome: &str) {
    CANCELLATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_listing_failure(listing: &str) {
    LISTING_FAILURES_TOTAL.with_label_values(&[listing]).inc();
}

/// Gather all registered metrics in Prometheus text format.
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_metrics().expect("first init");
        init_metrics().expect("second init");
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().expect("metrics initialization should succeed");

        record_launch("wait_until_done", "completed");
        record_cancellation("requested");

        let output = gather_metrics().expect("gather should succeed");
        assert!(output.contains("cloudjobs_launches_total"));
        assert!(output.contains("cloudjobs_cancellations_total"));
    }
}
