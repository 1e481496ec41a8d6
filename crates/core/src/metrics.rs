//! Prometheus metrics for core components.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntGauge};

/// Submissions accepted (job created).
pub static DOWNLOADS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubetap_downloads_submitted_total",
        "Total download submissions accepted",
    )
    .unwrap()
});

/// Pipelines started.
pub static DOWNLOADS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubetap_downloads_started_total",
        "Total download pipelines started",
    )
    .unwrap()
});

/// Downloads completed successfully.
pub static DOWNLOADS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubetap_downloads_completed_total",
        "Total downloads completed successfully",
    )
    .unwrap()
});

/// Downloads that failed.
pub static DOWNLOADS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubetap_downloads_failed_total",
        "Total downloads that failed",
    )
    .unwrap()
});

/// Pipelines currently running.
pub static ACTIVE_DOWNLOADS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubetap_active_downloads",
        "Number of download pipelines currently running",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(DOWNLOADS_SUBMITTED.clone()),
        Box::new(DOWNLOADS_STARTED.clone()),
        Box::new(DOWNLOADS_COMPLETED.clone()),
        Box::new(DOWNLOADS_FAILED.clone()),
        Box::new(ACTIVE_DOWNLOADS.clone()),
    ]
}
