//! Metrics and observability utilities
//!
//! Provides Prometheus metric descriptions and recording helpers
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PaperWeb metrics
pub const METRICS_PREFIX: &str = "paperweb";

/// Histogram buckets for HTTP request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.050,  // 50ms - cached network
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Buckets for network builds (paced upstream calls make these slow)
pub const BUILD_BUCKETS: &[f64] = &[
    1.0,
    5.0,
    10.0,
    30.0,
    60.0,
    120.0,
    300.0,
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Network build metrics
    describe_counter!(
        format!("{}_network_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Total network builds by outcome"
    );

    describe_histogram!(
        format!("{}_network_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Network build latency in seconds"
    );

    describe_histogram!(
        format!("{}_network_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes per built network"
    );

    describe_counter!(
        format!("{}_degraded_nodes_total", METRICS_PREFIX),
        Unit::Count,
        "Nodes synthesized after a failed resolution"
    );

    // Upstream source metrics
    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total upstream bibliographic API requests"
    );

    describe_counter!(
        format!("{}_upstream_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Upstream requests retried after a transient failure"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a finished network build
pub fn record_build(duration_secs: f64, outcome: &str, node_count: usize, degraded_count: usize) {
    counter!(
        format!("{}_network_builds_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_network_build_duration_seconds", METRICS_PREFIX))
        .record(duration_secs);

    histogram!(format!("{}_network_nodes", METRICS_PREFIX))
        .record(node_count as f64);

    if degraded_count > 0 {
        counter!(format!("{}_degraded_nodes_total", METRICS_PREFIX))
            .increment(degraded_count as u64);
    }
}

/// Helper to record an upstream response
pub fn record_upstream(source: &str, status: &str) {
    counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Helper to record a retry
pub fn record_retry(source: &str, kind: &str) {
    counter!(
        format!("{}_upstream_retries_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sorted() {
        for buckets in [LATENCY_BUCKETS, BUILD_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/v1/network");
        std::thread::sleep(std::time::Duration::from_millis(10));
        metrics.finish(200);
        // Just verify it runs without a recorder installed
    }

    #[test]
    fn test_recording_helpers() {
        record_build(1.5, "success", 42, 3);
        record_upstream("semantic_scholar", "ok");
        record_retry("semantic_scholar", "rate_limited");
        record_cache(false, "memory");
    }
}
