//! # Global Configuration
//!
//! Lifecycle of the singleton [`GlobalConfig`] record: `init` creates it,
//! `config`/`rotate` tune it, `migrate` bumps its schema version and
//! `evacuate` tears it down.

use crate::domain::entities::{GlobalConfig, GlobalTtl};
use crate::domain::ledger::Ledger;
use crate::errors::{LedgerError, LedgerResult};
use shared_types::{Asset, Authority};

/// Schema versions this build can operate on.
pub const KNOWN_VERSIONS: &[u64] = &[0];

const EVACUATION_MEMO: &str = "Contingency protocol";

impl Ledger<'_> {
    /// Creates the configuration record.
    ///
    /// After an `evacuate`, `locked` must again cover every reserved balance
    /// or the custody invariant rejects the unit.
    pub fn init(&mut self, locked: Asset, witness: Authority, ttl: GlobalTtl) -> LedgerResult<()> {
        self.require_admin()?;
        if self.state.is_initialized() {
            return Err(LedgerError::AlreadyInitialized);
        }
        self.check_non_negative("locked", locked)?;
        if !self.chain.account_exists(&witness.actor) {
            return Err(LedgerError::WitnessAccountMissing);
        }
        ttl.validate()?;

        self.state.config = Some(GlobalConfig {
            version: 0,
            locked,
            witness,
            last_sync: 0,
            ttl,
        });
        Ok(())
    }

    /// Replaces the time windows.
    pub fn configure(&mut self, ttl: GlobalTtl) -> LedgerResult<()> {
        self.require_admin()?;
        let current = self.config()?.ttl;
        ttl.validate()?;
        if current == ttl {
            return Err(LedgerError::Redundant);
        }
        self.state.config_mut()?.ttl = ttl;
        Ok(())
    }

    /// Replaces the witness authority.
    pub fn rotate(&mut self, witness: Authority) -> LedgerResult<()> {
        self.require_admin()?;
        if self.config()?.witness == witness {
            return Err(LedgerError::Redundant);
        }
        if !self.chain.account_exists(&witness.actor) {
            return Err(LedgerError::WitnessAccountMissing);
        }
        self.state.config_mut()?.witness = witness;
        Ok(())
    }

    /// Emergency shutdown. Sweeps the ledger account's own holdings to the
    /// custodian unless the custodian is a contract, then clears the
    /// configuration. Tables are kept.
    pub fn evacuate(&mut self, reason: &str) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;
        if reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        let ledger = self.settings.ledger_account.clone();
        let custodian = self.settings.custodian_account.clone();
        let holdings = self.projected_balance(&ledger);
        if holdings.is_positive() && !self.chain.is_contract(&custodian) {
            self.schedule_transfer(ledger, custodian, holdings, EVACUATION_MEMO);
        }

        self.state.config = None;
        Ok(())
    }

    /// Moves the configuration to schema `version`.
    pub fn migrate(&mut self, version: u64) -> LedgerResult<()> {
        self.require_admin()?;
        let current = self.config()?.version;
        if version == current {
            return Err(LedgerError::Redundant);
        }
        if version < current {
            return Err(LedgerError::VersionDowngrade);
        }
        if !KNOWN_VERSIONS.contains(&version) {
            return Err(LedgerError::UnknownVersion);
        }
        self.state.config_mut()?.version = version;
        Ok(())
    }
}
