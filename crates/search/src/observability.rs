use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static QUERIES_SETTLED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "post_search_queries_settled_total",
        "Total search queries emitted after the quiet period"
    )
    .expect("register queries_settled_total")
});

pub static QUERIES_SUPPRESSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "post_search_queries_suppressed_total",
        "Total settled queries dropped as consecutive duplicates"
    )
    .expect("register queries_suppressed_total")
});

pub static FETCH_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "post_search_fetch_requests_total",
        "Total posts requests issued"
    )
    .expect("register fetch_requests_total")
});

pub static FETCH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "post_search_fetch_failures_total",
        "Total posts requests that failed, by error kind",
        &["kind"]
    )
    .expect("register fetch_failures_total")
});

pub static STALE_RESPONSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "post_search_stale_responses_total",
        "Total responses discarded because a newer list was already displayed"
    )
    .expect("register stale_responses_total")
});

pub static FETCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "post_search_fetch_duration_seconds",
        "Posts request duration in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register fetch_duration")
});

/// Text exposition of the default registry.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {e}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_metrics_include_counters() {
        FETCH_REQUESTS_TOTAL.inc();
        FETCH_FAILURES_TOTAL.with_label_values(&["decode"]).inc();
        let text = encode_metrics();
        assert!(text.contains("post_search_fetch_requests_total"));
        assert!(text.contains("post_search_fetch_failures_total{kind=\"decode\"}"));
    }
}
