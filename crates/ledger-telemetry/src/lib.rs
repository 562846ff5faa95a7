//! # Ledger Telemetry
//!
//! Logging and metrics for the affiliate ledger.
//!
//! ## Components
//!
//! - Structured logs through `tracing-subscriber` (pretty or JSON)
//! - Prometheus collectors in a private registry, exported as text
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AL_SERVICE_NAME` | `affiliate-ledger` | Service name in logs |
//! | `AL_LOG_LEVEL` | `info` | Log level filter |
//! | `AL_JSON_LOGS` | `false` | JSON log lines |
//! | `AL_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `AL_METRICS` | `true` | Register Prometheus collectors |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{encode_metrics, register_metrics};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, if enabled, the metrics registry.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics {
        register_metrics()?;
    }
    init_tracing(config)
}
