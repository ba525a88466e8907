/// Prometheus metrics for the inventory service
///
/// Covers HTTP traffic, the password reset flow, logins, catalog searches
/// and the error log.

use crate::error::{InventoryError, InventoryResult};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Auth Metrics ==========

    /// Reset requests and confirmations by outcome
    pub static ref PASSWORD_RESETS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "password_resets_total",
        "Password reset requests and confirmations by outcome",
        &["stage", "outcome"]
    )
    .unwrap();

    /// Login attempts by outcome
    pub static ref LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "logins_total",
        "Login attempts by outcome",
        &["outcome"]
    )
    .unwrap();

    // ========== Catalog Metrics ==========

    /// Catalog searches, split by whether anything matched
    pub static ref COMPONENT_SEARCHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "component_searches_total",
        "Component searches by result",
        &["found"]
    )
    .unwrap();

    // ========== Error Metrics ==========

    /// Entries written to the error log
    pub static ref ERRORS_LOGGED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_logged_total",
        "Server errors written to the error log",
        &["status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> InventoryResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| InventoryError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| InventoryError::Internal(format!("Metrics are not UTF-8: {}", e)))
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a reset flow outcome (`stage` is "request" or "confirm")
pub fn record_password_reset(stage: &str, outcome: &str) {
    PASSWORD_RESETS_TOTAL
        .with_label_values(&[stage, outcome])
        .inc();
}

pub fn record_login(success: bool) {
    LOGINS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

pub fn record_component_search(found: bool) {
    COMPONENT_SEARCHES_TOTAL
        .with_label_values(&[if found { "true" } else { "false" }])
        .inc();
}

pub fn record_error_logged(status: u16) {
    ERRORS_LOGGED_TOTAL
        .with_label_values(&[&status.to_string()])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/components/search/", 200, 0.05);
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("http_requests_total"));
        assert!(metrics.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_record_password_reset() {
        record_password_reset("request", "sent");
        record_password_reset("confirm", "rejected");
        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("password_resets_total"));
        assert!(metrics.contains("stage=\"confirm\""));
    }

    #[test]
    fn test_metrics_rendering() {
        record_login(true);
        record_component_search(false);
        record_error_logged(500);

        let metrics = render_metrics().unwrap();
        assert!(metrics.contains("# HELP"));
        assert!(metrics.contains("# TYPE"));
        assert!(metrics.contains("logins_total"));
        assert!(metrics.contains("component_searches_total"));
        assert!(metrics.contains("errors_logged_total"));
    }
}
