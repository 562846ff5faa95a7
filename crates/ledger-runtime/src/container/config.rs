//! # Runtime Configuration
//!
//! Ledger settings, telemetry settings, where the runtime keeps its state and
//! which session script it replays.

use affiliate_ledger::config::{ConfigError as LedgerConfigError, LedgerConfig};
use ledger_telemetry::TelemetryConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Ledger deployment settings.
    pub ledger: LedgerConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
    /// JSON state file.
    pub state_path: PathBuf,
    /// Session script to replay, if any.
    pub script_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            telemetry: TelemetryConfig::default(),
            state_path: PathBuf::from("./data/ledger.json"),
            script_path: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Ledger(#[from] LedgerConfigError),

    /// State path is empty or points at a directory.
    #[error("invalid state path {0}")]
    InvalidStatePath(PathBuf),
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - everything [`LedgerConfig::from_env`] and [`TelemetryConfig::from_env`] read
    /// - `AL_STATE_PATH`: state file (default: ./data/ledger.json)
    /// - `AL_SCRIPT`: session script to replay (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            ledger: LedgerConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
            state_path: std::env::var("AL_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            script_path: std::env::var("AL_SCRIPT").ok().map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate()?;
        if self.state_path.as_os_str().is_empty() || self.state_path.is_dir() {
            return Err(ConfigError::InvalidStatePath(self.state_path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_directory_state_path_rejected() {
        let dir = std::env::temp_dir();
        let config = RuntimeConfig {
            state_path: dir,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStatePath(_))
        ));
    }
}
