//! Prometheus Metrics Module
//!
//! Provides process-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Dispatched commands by command name and outcome
//! - Command dispatch latency histograms
//! - Contained dispatch errors by error kind

use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Dispatch counter - tracks messages that resolved to a command, by outcome
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("commands_total", "Total number of dispatched commands").namespace("botframe"),
        &["command", "outcome"],
    )
    .expect("Failed to create COMMANDS_TOTAL metric")
});

/// Dispatch latency histogram - filters plus handler, in seconds
pub static COMMAND_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new("command_duration_seconds", "Command dispatch latency in seconds")
            .namespace("botframe")
            .buckets(buckets),
        &["command"],
    )
    .expect("Failed to create COMMAND_DURATION_SECONDS metric")
});

/// Contained errors by kind
pub static DISPATCH_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("dispatch_errors_total", "Errors contained at the dispatch boundary").namespace("botframe"),
        &["kind"],
    )
    .expect("Failed to create DISPATCH_ERRORS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .expect("Failed to register COMMANDS_TOTAL");
    registry
        .register(Box::new(COMMAND_DURATION_SECONDS.clone()))
        .expect("Failed to register COMMAND_DURATION_SECONDS");
    registry
        .register(Box::new(DISPATCH_ERRORS_TOTAL.clone()))
        .expect("Failed to register DISPATCH_ERRORS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %err, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record one dispatch
pub fn record_dispatch(command: &str, outcome: &str, elapsed: Duration) {
    COMMANDS_TOTAL.with_label_values(&[command, outcome]).inc();
    COMMAND_DURATION_SECONDS
        .with_label_values(&[command])
        .observe(elapsed.as_secs_f64());
}

/// Helper to record a contained error
pub fn record_dispatch_error(kind: &str) {
    DISPATCH_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}
