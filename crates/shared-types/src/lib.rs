//! # Shared Types Crate
//!
//! Value types shared by the ledger core, its adapters and the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: account names, authorities, assets and
//!   transfer payloads are defined once, here.
//! - **Validated Construction**: every type that has a well-formedness rule
//!   (`AccountName`, `Asset`, `Symbol`) can only be built through a checked
//!   constructor; serde goes through the same checks.
//! - **No Floating Amounts**: amounts are fixed-point `i64` in the symbol's
//!   precision. Rates are the only floating values in the system.

pub mod asset;
pub mod entities;
pub mod errors;
pub mod ipc;

pub use asset::{Asset, Symbol, MAX_ASSET_AMOUNT};
pub use entities::{AccountName, Authority, PermissionName, Timestamp};
pub use errors::{AssetError, NameError};
pub use ipc::{TransferNotice, TransferRequest};
