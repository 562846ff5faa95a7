//! Prometheus metrics for the affiliate ledger.
//!
//! All metrics follow the naming convention: `al_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: committed and rejected actions, executed transfers
//! - **Gauge**: locked funds, table sizes
//! - **Histogram**: action latency

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
];

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Committed actions by name
    pub static ref ACTIONS_COMMITTED: CounterVec = CounterVec::new(
        Opts::new("al_ledger_actions_committed_total", "Actions committed"),
        &["action"]
    ).expect("metric creation failed");

    /// Rejected actions by name and error class
    pub static ref ACTIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("al_ledger_actions_rejected_total", "Actions rejected"),
        &["action", "class"]  // class: validation/authorization/consistency/resource/redundancy
    ).expect("metric creation failed");

    /// Time from load to commit
    pub static ref ACTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "al_ledger_action_duration_seconds",
            "Time spent executing an action"
        ).buckets(LATENCY_BUCKETS.to_vec())
    ).expect("metric creation failed");

    // =========================================================================
    // TREASURY
    // =========================================================================

    /// Transfers executed through the treasury
    pub static ref TRANSFERS_EXECUTED: Counter = Counter::new(
        "al_treasury_transfers_executed_total",
        "Outbound transfers executed"
    ).expect("metric creation failed");

    /// Funds reserved in custody, in smallest units
    pub static ref LOCKED_FUNDS: Gauge = Gauge::new(
        "al_treasury_locked_units",
        "Funds the ledger keeps reserved in custody"
    ).expect("metric creation failed");

    // =========================================================================
    // TABLES
    // =========================================================================

    /// Partner rows
    pub static ref PARTNERS: Gauge = Gauge::new(
        "al_tables_partners",
        "Number of partners"
    ).expect("metric creation failed");

    /// Application rows
    pub static ref APPLICATIONS: Gauge = Gauge::new(
        "al_tables_applications",
        "Number of pending applications"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIONS_COMMITTED.clone()),
        Box::new(ACTIONS_REJECTED.clone()),
        Box::new(ACTION_DURATION.clone()),
        Box::new(TRANSFERS_EXECUTED.clone()),
        Box::new(LOCKED_FUNDS.clone()),
        Box::new(PARTNERS.clone()),
        Box::new(APPLICATIONS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a committed action.
pub fn record_committed(action: &str, seconds: f64) {
    ACTIONS_COMMITTED.with_label_values(&[action]).inc();
    ACTION_DURATION.observe(seconds);
}

/// Record a rejected action with its error class.
pub fn record_rejected(action: &str, class: &str) {
    ACTIONS_REJECTED.with_label_values(&[action, class]).inc();
}

/// Record executed transfers.
pub fn record_transfers(count: usize) {
    TRANSFERS_EXECUTED.inc_by(count as f64);
}

/// Publish the post-commit table sizes and locked amount.
pub fn record_state(locked: i64, partners: usize, applications: usize) {
    LOCKED_FUNDS.set(locked as f64);
    PARTNERS.set(partners as f64);
    APPLICATIONS.set(applications as f64);
}
