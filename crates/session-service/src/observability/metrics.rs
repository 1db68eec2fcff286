//! Metrics definitions for the session service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `session_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: access, refresh, long_lived
//! - `status`: success, error (plus timeout for store operations)
//! - `error_category`: see `ErrorCategory` (6 values, plus none)
//! - `operation`: put, get, delete, ping

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle used to
/// render `/metrics`.
///
/// Must be called before any metrics are recorded. Store latency buckets
/// are aligned with the default 500ms per-attempt timeout.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("session_store".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set store latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Metric: `session_tokens_issued_total`
/// Labels: `kind`
pub fn record_token_issued(kind: &'static str) {
    counter!("session_tokens_issued_total", "kind" => kind).increment(1);
}

/// Metric: `session_validations_total`
/// Labels: `status`, `error_category`
pub fn record_validation(status: &'static str, error_category: Option<&'static str>) {
    let category = error_category.unwrap_or("none");
    counter!("session_validations_total", "status" => status, "error_category" => category)
        .increment(1);
}

/// Metric: `session_refresh_total`
/// Labels: `status`
pub fn record_refresh(status: &'static str) {
    counter!("session_refresh_total", "status" => status).increment(1);
}

/// Metric: `session_revocations_total`
/// Labels: `status`
pub fn record_revocation(status: &'static str) {
    counter!("session_revocations_total", "status" => status).increment(1);
}

// ============================================================================
// Credential Store Metrics
// ============================================================================

/// Record one store attempt.
///
/// Metric: `session_store_operation_duration_seconds`
/// Labels: `operation`, `status`
pub fn record_store_operation(operation: &'static str, status: &'static str, duration: Duration) {
    histogram!(
        "session_store_operation_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(duration.as_secs_f64());
}

/// Metric: `session_store_retries_total`
/// Labels: `operation`
pub fn record_store_retry(operation: &'static str) {
    counter!("session_store_retries_total", "operation" => operation).increment(1);
}
