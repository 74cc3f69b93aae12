//! Prometheus Metrics for Sitegate
//!
//! Provides site middleware, visitor and content graph metrics.

use lazy_static::lazy_static;
use prometheus::{self, CounterVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Middleware Metrics
    pub static ref SITE_ACTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("sitegate_site_actions_total", "Site middleware decisions by rule"),
        &["rule", "action"]
    ).unwrap();

    pub static ref VISITORS_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "sitegate_visitors_issued_total",
        "Visitor identifiers generated for browsers without one"
    ).unwrap();

    // Content Graph Metrics
    pub static ref GRAPH_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("sitegate_graph_requests_total", "Total content graph requests"),
        &["operation", "status"]
    ).unwrap();

    pub static ref GRAPH_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sitegate_graph_duration_seconds",
            "Content graph request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"]
    ).unwrap();
}

/// Register all metrics with the registry
pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(SITE_ACTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VISITORS_ISSUED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GRAPH_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GRAPH_DURATION.clone()))?;
    Ok(())
}

/// Handler for /api/metrics - returns Prometheus text format
pub async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}

/// Record the rule chain outcome for a request
pub fn record_site_action(rule: &str, action: &str) {
    SITE_ACTIONS_TOTAL.with_label_values(&[rule, action]).inc();
}

/// Record a freshly generated visitor id
pub fn record_visitor_issued() {
    VISITORS_ISSUED_TOTAL.inc();
}

/// Record a content graph request
pub fn record_graph_request(operation: &str, status: u16, duration_secs: f64) {
    GRAPH_REQUESTS_TOTAL
        .with_label_values(&[operation, &status.to_string()])
        .inc();
    GRAPH_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}
