//! # Session Scripts
//!
//! A script describes a ledger session: the chain it starts from and the
//! steps replayed against it. Each step is a signed action, a transfer
//! relayed through the ledger, a raw transfer notice, or a clock move.
//!
//! ```json
//! {
//!   "start_time": 1700000000000,
//!   "accounts": ["alice", "bob"],
//!   "balances": [{ "account": "alice", "quantity": "50.0000 EOS" }],
//!   "steps": [
//!     { "step": "action", "signers": ["affiliate"], "action": { "action": "activate", "license": 0 } },
//!     { "step": "advance", "seconds": 3600 }
//!   ]
//! }
//! ```
//!
//! A rejected step does not stop the run; it is reported and the next step
//! sees the state the last committed step left.

use crate::container::LedgerContainer;
use affiliate_ledger::ports::inbound::{Action, LedgerApi, Receipt};
use serde::{Deserialize, Serialize};
use shared_types::{
    AccountName, Asset, Authority, NameError, Timestamp, TransferNotice, TransferRequest,
};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use ledger_telemetry::log_event;
use tracing::debug;

/// Script loading errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed script: {0}")]
    Parse(#[from] serde_json::Error),

    /// A signer is not a valid `actor` or `actor@permission`.
    #[error("step {step}: invalid signer {signer}: {source}")]
    InvalidSigner {
        step: usize,
        signer: String,
        #[source]
        source: NameError,
    },
}

/// Opening chain balance of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBalance {
    pub account: AccountName,
    pub quantity: Asset,
}

/// One step of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Submits an action signed by `signers`.
    Action { signers: Vec<String>, action: Action },
    /// Moves tokens through the ledger, which is notified of the transfer.
    Transfer {
        signers: Vec<String>,
        transfer: TransferRequest,
    },
    /// Delivers a transfer notice without moving tokens.
    Notice { notice: TransferNotice },
    /// Moves the clock forward.
    Advance { seconds: u64 },
}

impl Step {
    fn kind(&self) -> &'static str {
        match self {
            Self::Action { action, .. } => action.name(),
            Self::Transfer { .. } => "transfer",
            Self::Notice { .. } => "notice",
            Self::Advance { .. } => "advance",
        }
    }
}

/// A ledger session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Clock value the session starts at, in milliseconds.
    #[serde(default)]
    pub start_time: Timestamp,
    /// Accounts that exist on the chain.
    #[serde(default)]
    pub accounts: Vec<AccountName>,
    /// Accounts with code deployed.
    #[serde(default)]
    pub contracts: Vec<AccountName>,
    #[serde(default)]
    pub balances: Vec<OpeningBalance>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parses every signer list up front so a typo fails the whole script.
    fn signers(&self) -> Result<Vec<BTreeSet<Authority>>, ScriptError> {
        self.steps
            .iter()
            .enumerate()
            .map(|(step, s)| {
                let raw: &[String] = match s {
                    Step::Action { signers, .. } | Step::Transfer { signers, .. } => signers,
                    Step::Notice { .. } | Step::Advance { .. } => &[],
                };
                raw.iter()
                    .map(|signer| {
                        signer
                            .parse::<Authority>()
                            .map_err(|source| ScriptError::InvalidSigner {
                                step,
                                signer: signer.clone(),
                                source,
                            })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Seeds the chain of `container` with the accounts and balances of `script`.
pub fn seed_chain(container: &LedgerContainer, script: &Script) {
    for account in &script.accounts {
        container.chain.create_account(account.clone());
    }
    for contract in &script.contracts {
        container.chain.mark_contract(contract.clone());
    }
    for opening in &script.balances {
        container.chain.issue(&opening.account, opening.quantity);
    }
}

/// Replays the steps of `script` against `container`.
pub async fn run_script(
    container: &LedgerContainer,
    script: &Script,
) -> Result<Vec<StepReport>, ScriptError> {
    let signers = script.signers()?;
    let mut reports = Vec::with_capacity(script.steps.len());

    for (index, (step, signers)) in script.steps.iter().zip(signers).enumerate() {
        debug!(index, step = step.kind(), "replaying step");
        let result = match step {
            Step::Action { action, .. } => {
                Some(container.service.submit(signers, action.clone()).await)
            }
            Step::Transfer { transfer, .. } => {
                Some(container.service.transfer(signers, transfer.clone()).await)
            }
            Step::Notice { notice } => Some(container.service.on_transfer(notice.clone()).await),
            Step::Advance { seconds } => {
                container.clock.advance(seconds.saturating_mul(1_000));
                None
            }
        };

        let (receipt, error) = match result {
            Some(Ok(receipt)) => (Some(receipt), None),
            Some(Err(e)) => {
                log_event!(warn, "script", "step rejected", index, error = %e);
                (None, Some(e.to_string()))
            }
            None => (None, None),
        };
        reports.push(StepReport {
            index,
            step: step.kind().to_string(),
            receipt,
            error,
        });
    }

    let rejected = reports.iter().filter(|r| !r.is_ok()).count();
    log_event!(info, "script", "script replayed", steps = reports.len(), rejected);
    Ok(reports)
}
