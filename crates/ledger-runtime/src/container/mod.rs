//! # Ledger Container
//!
//! Holds the ledger service together with the adapters it runs on: the JSON
//! state file, the in-memory chain acting as host and treasury, and a manual
//! clock the session script drives.

pub mod config;

pub use config::{ConfigError, RuntimeConfig};

use affiliate_ledger::adapters::{InMemoryChain, JsonFileStateStore};
use affiliate_ledger::ports::outbound::ManualClock;
use affiliate_ledger::service::LedgerService;
use shared_types::Timestamp;
use std::sync::Arc;
use ledger_telemetry::log_event;

/// Service plus the handles the runtime keeps on its adapters.
pub struct LedgerContainer {
    pub service: Arc<LedgerService>,
    pub chain: Arc<InMemoryChain>,
    pub clock: Arc<ManualClock>,
}

impl LedgerContainer {
    /// Wires a service over the state file named in `config`.
    ///
    /// The ledger, custody, custodian and token accounts exist on the chain
    /// from the start; the token contract is flagged as a contract.
    pub fn build(config: &RuntimeConfig, start_time: Timestamp) -> Self {
        let ledger = &config.ledger;
        let chain = Arc::new(InMemoryChain::with_accounts([
            &ledger.ledger_account,
            &ledger.custody_account,
            &ledger.custodian_account,
        ]));
        chain.mark_contract(ledger.token_contract.clone());

        let clock = Arc::new(ManualClock::new(start_time));
        let store = Arc::new(JsonFileStateStore::new(&config.state_path));

        log_event!(
            info,
            "container",
            "ledger container initialized",
            state_path = %config.state_path.display(),
            ledger = %ledger.ledger_account,
            custody = %ledger.custody_account
        );

        let service = Arc::new(LedgerService::new(
            ledger.clone(),
            store,
            chain.clone(),
            chain.clone(),
            clock.clone(),
        ));

        Self {
            service,
            chain,
            clock,
        }
    }
}
