//! # Outbound Ports (Driven Ports)
//!
//! Host services the ledger depends on.
//!
//! | Port | Purpose |
//! |------|---------|
//! | `ChainHost` | Account existence, contract detection, token balances |
//! | `TransferExecutor` | All-or-nothing execution of a transfer batch |
//! | `StateStore` | Load and commit the ledger state |
//! | `TimeSource` | Current time for TTL checks |

use crate::domain::state::LedgerState;
use crate::errors::{StoreError, TreasuryError};
use async_trait::async_trait;
use shared_types::{AccountName, Asset, Symbol, Timestamp, TransferRequest};
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only view of the host chain.
pub trait ChainHost: Send + Sync {
    /// True if `account` exists on the chain.
    fn account_exists(&self, account: &AccountName) -> bool;

    /// True if `account` has code deployed.
    fn is_contract(&self, account: &AccountName) -> bool;

    /// Token balance of `account` in `symbol` (zero if none).
    fn balance_of(&self, account: &AccountName, symbol: Symbol) -> Asset;
}

/// Executes transfers requested by the ledger.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Executes every transfer of the batch, or none of them.
    async fn execute_batch(&self, transfers: &[TransferRequest]) -> Result<(), TreasuryError>;
}

/// Persistence of the ledger state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Loads the last committed state (empty state if nothing was committed).
    async fn load(&self) -> Result<LedgerState, StoreError>;

    /// Replaces the stored state.
    async fn commit(&self, state: &LedgerState) -> Result<(), StoreError>;
}

/// Time source abstraction for testability.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Clock that only moves when told to. Used by tests and scripted runs.
#[derive(Debug, Default)]
pub struct ManualClock {
    time: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Moves the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}
