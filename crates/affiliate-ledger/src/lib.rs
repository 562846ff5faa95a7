//! # Affiliate Ledger
//!
//! Licensing and partner-accounting ledger for a revenue-share program.
//!
//! ## Purpose
//!
//! Administrators publish licenses (revenue-share products with a fee, a rate
//! schedule and terms). Accounts apply for a license, fund the application
//! with a deposit and claim it to become partners. Partners accumulate a
//! signed balance, refer others as brokers, and withdraw their earnings. The
//! ledger keeps every partner balance and pending deposit covered by funds
//! held in a custody account.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Custody cover: `sum(max(balance, 0)) + sum(deposit) <= locked` | `domain/invariants.rs` - checked after every unit |
//! | Custody balance never below `locked` after an outbound transfer | `domain/ledger.rs` - `check_custody_cover()` |
//! | One role per account (primary, standby or applicant) | `domain/ledger.rs` - `check_unused_account()`, unique indices |
//! | One partner or application per affiliate | `domain/tables.rs` - unique `by_affiliate` |
//! | Broker roots have no root | `domain/broker.rs` - `resolve_broker()` |
//! | Archived licenses are never reactivated | `domain/license_catalog.rs` - `activate()` |
//! | Rate shape of a license never changes | `domain/partners.rs` - `upgrade()` requires the same shape |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory chain, in-memory and JSON file stores    │
//! │  service.rs - LedgerService: units of work, stats, metrics      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - Action, Receipt, LedgerApi                 │
//! │  ports/outbound.rs - ChainHost, TransferExecutor, StateStore,   │
//! │                      TimeSource                                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/ledger.rs  - per-operation executor                     │
//! │  domain/*.rs       - catalog, scope, brokers, applications,     │
//! │                      partners, config, notifications            │
//! │  domain/tables.rs  - indexed tables                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use affiliate_ledger::prelude::*;
//!
//! let service = LedgerService::in_memory(LedgerConfig::default(), chain, clock);
//! let receipt = service.submit(signers, Action::Claim { partner }).await?;
//! for transfer in receipt.effects { /* ... */ }
//! ```

// Crate-level lints
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::{
        check_all_invariants, ActionContext, Application, ApplicationId, Broker, BrokerCursor,
        BrokerRequest, Created, Effect, EntityRef, GlobalConfig, GlobalTtl, InvariantViolation,
        Ledger, LedgerState, License, LicenseId, LicenseRate, LicenseTerms, Outcome, Partner,
        PartnerId, Rate, RateLimit, RatePayer, SyncEntry,
    };

    // Ports
    pub use crate::ports::inbound::{Action, LedgerApi, Receipt};
    pub use crate::ports::outbound::{
        ChainHost, ManualClock, StateStore, SystemTimeSource, TimeSource, TransferExecutor,
    };

    // Adapters
    pub use crate::adapters::{InMemoryChain, InMemoryStateStore, JsonFileStateStore};

    // Errors and configuration
    pub use crate::config::{ConfigError, LedgerConfig};
    pub use crate::errors::{
        ErrorClass, LedgerError, LedgerResult, StoreError, TableError, TreasuryError,
    };

    // Service
    pub use crate::service::{LedgerService, ServiceStats};

    // Shared types
    pub use shared_types::{
        AccountName, Asset, Authority, PermissionName, Symbol, Timestamp, TransferNotice,
        TransferRequest,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
