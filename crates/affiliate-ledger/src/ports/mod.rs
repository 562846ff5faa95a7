//! Ports layer for the affiliate ledger.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: API exposed to callers
//! - Outbound (Driven) ports: Dependencies on the host chain and storage

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
