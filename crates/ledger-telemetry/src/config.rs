//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to register the Prometheus collectors
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "affiliate-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics: true,
        }
    }
}

fn flag(var: &str, default: bool) -> bool {
    env::var(var)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AL_SERVICE_NAME`: Service name (default: affiliate-ledger)
    /// - `AL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AL_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `AL_METRICS`: Register Prometheus collectors (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("AL_SERVICE_NAME")
                .unwrap_or_else(|_| "affiliate-ledger".to_string()),

            log_level: env::var("AL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: flag("AL_CONSOLE_OUTPUT", true),

            json_logs: flag("AL_JSON_LOGS", is_container),

            metrics: flag("AL_METRICS", true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "affiliate-ledger");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }
}
