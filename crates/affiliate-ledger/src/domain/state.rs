//! # Ledger State
//!
//! The whole persisted state: the config singleton and the three tables.
//! Operations work on a clone and the clone replaces the stored state only
//! when the operation and all of its effects succeed.

use crate::domain::entities::GlobalConfig;
use crate::domain::tables::{ApplicationTable, LicenseTable, PartnerTable};
use crate::errors::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Complete ledger state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// `None` until `init`, and again after `evacuate`.
    #[serde(default)]
    pub config: Option<GlobalConfig>,
    #[serde(default)]
    pub licenses: LicenseTable,
    #[serde(default)]
    pub applications: ApplicationTable,
    #[serde(default)]
    pub partners: PartnerTable,
}

impl LedgerState {
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    pub fn config(&self) -> LedgerResult<&GlobalConfig> {
        self.config.as_ref().ok_or(LedgerError::NotInitialized)
    }

    pub fn config_mut(&mut self) -> LedgerResult<&mut GlobalConfig> {
        self.config.as_mut().ok_or(LedgerError::NotInitialized)
    }
}
