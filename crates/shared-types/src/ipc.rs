//! # Transfer Payloads
//!
//! Messages exchanged with the token/treasury collaborator.
//!
//! ## Design Rules
//!
//! - `TransferRequest` is outbound: the ledger asks the treasury to move funds
//!   out of custody. Requests are executed as one batch after the operation
//!   that produced them, or not at all.
//! - `TransferNotice` is inbound: the treasury reports that funds moved.

use crate::asset::Asset;
use crate::entities::AccountName;
use serde::{Deserialize, Serialize};

/// Outbound transfer the ledger wants executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Paying account (custody or the ledger account itself).
    pub from: AccountName,
    /// Receiving account.
    pub to: AccountName,
    /// Amount to move.
    pub quantity: Asset,
    /// Human readable memo.
    pub memo: String,
}

/// Notification that a transfer happened on the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNotice {
    /// Paying account.
    pub from: AccountName,
    /// Receiving account.
    pub to: AccountName,
    /// Amount moved.
    pub quantity: Asset,
    /// Memo attached by the payer.
    #[serde(default)]
    pub memo: String,
}
