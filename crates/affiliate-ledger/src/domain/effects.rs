//! # Effects
//!
//! Follow-up commands an operation schedules instead of firing them eagerly.
//! The runner executes them after the operation succeeds, as part of the same
//! atomic unit.

use crate::domain::value_objects::{ApplicationId, LicenseId, PartnerId};
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, TransferRequest};

/// A scheduled follow-up command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Token transfer to execute through the treasury.
    Transfer(TransferRequest),
    /// Account to inform that the operation concerned it.
    Notify { recipient: AccountName },
}

/// Row created by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Created {
    License(LicenseId),
    Application(ApplicationId),
    Partner(PartnerId),
}

/// Result of a successful operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub created: Option<Created>,
    pub effects: Vec<Effect>,
}

impl Outcome {
    /// Transfers among the effects, in scheduling order.
    #[must_use]
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Transfer(t) => Some(t.clone()),
                Effect::Notify { .. } => None,
            })
            .collect()
    }

    /// Notified accounts, deduplicated, in scheduling order.
    #[must_use]
    pub fn recipients(&self) -> Vec<AccountName> {
        let mut out: Vec<AccountName> = Vec::new();
        for effect in &self.effects {
            if let Effect::Notify { recipient } = effect {
                if !out.contains(recipient) {
                    out.push(recipient.clone());
                }
            }
        }
        out
    }
}
