//! Prometheus metrics for launchscope pipelines
//!
//! Tracks how often each analysis runs, how long it takes, how many points it
//! produces and how many input records were skipped.
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all pipeline metrics
struct AnalyticsMetrics {
    computations: CounterVec,
    computation_duration: HistogramVec,
    points_produced: CounterVec,
    records_skipped: CounterVec,
}

static ANALYTICS_METRICS: OnceLock<AnalyticsMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once. If registration fails the error is returned
/// and every recording function below silently does nothing.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = launchscope::metrics::init_metrics() {
///     tracing::warn!(error = %e, "Metrics disabled");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = AnalyticsMetrics {
        computations: register_counter_vec!(
            "launchscope_computations_total",
            "Total analytics computations by kind",
            &["kind"]
        )?,
        computation_duration: register_histogram_vec!(
            "launchscope_computation_duration_seconds",
            "Analytics computation duration in seconds",
            &["kind"],
            vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        )?,
        points_produced: register_counter_vec!(
            "launchscope_points_produced_total",
            "Total output points or rows produced by kind",
            &["kind"]
        )?,
        records_skipped: register_counter_vec!(
            "launchscope_records_skipped_total",
            "Total input records skipped by reason",
            &["reason"]
        )?,
    };

    ANALYTICS_METRICS
        .set(metrics)
        .map_err(|_| "Analytics metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    ANALYTICS_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start timing a computation; duration is recorded when the guard drops
pub fn start_computation_timer(kind: &str) -> MetricsTimer {
    match ANALYTICS_METRICS.get() {
        Some(m) => MetricsTimer::new(m.computation_duration.with_label_values(&[kind]).start_timer()),
        None => MetricsTimer::noop(),
    }
}

/// Record a finished computation and the number of points it produced
pub fn record_computation(kind: &str, points: usize) {
    let Some(m) = ANALYTICS_METRICS.get() else {
        return;
    };

    m.computations.with_label_values(&[kind]).inc();
    if points > 0 {
        m.points_produced
            .with_label_values(&[kind])
            .inc_by(points as f64);
    }
}

/// Record input records excluded from a computation
pub fn record_skipped(reason: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(m) = ANALYTICS_METRICS.get() {
        m.records_skipped
            .with_label_values(&[reason])
            .inc_by(count as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================
