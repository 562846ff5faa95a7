//! # Domain Layer
//!
//! Pure business logic of the affiliate ledger. No I/O: the executor reads the
//! chain through [`ChainHost`](crate::ports::ChainHost) and returns effects
//! instead of performing them.
//!
//! ## Components
//!
//! - `value_objects`: ids, rate schedules, broker cursors
//! - `entities`: License, Application, Partner, GlobalConfig
//! - `tables`: indexed tables with unique and multi indices
//! - `state`: the complete persisted state
//! - `ledger`: the per-operation executor and its shared checks
//! - `license_catalog`, `scope`, `broker`, `applications`, `partners`,
//!   `global_config`, `notifications`: operations, one `impl Ledger` each
//! - `custody`: `locked` arithmetic
//! - `invariants`: post-operation checks
//! - `effects`: scheduled transfers and notifications

pub mod applications;
pub mod broker;
pub mod custody;
pub mod effects;
pub mod entities;
pub mod global_config;
pub mod invariants;
pub mod ledger;
pub mod license_catalog;
pub mod notifications;
pub mod partners;
pub mod scope;
pub mod state;
pub mod tables;
pub mod value_objects;

pub use effects::{Created, Effect, Outcome};
pub use entities::*;
pub use invariants::{check_all_invariants, InvariantViolation};
pub use ledger::{ActionContext, Ledger};
pub use state::LedgerState;
pub use tables::{ApplicationTable, LicenseTable, PartnerTable};
pub use value_objects::*;
