//! # Inbound Ports (Driving Ports)
//!
//! The operation surface of the ledger.
//!
//! Every operation is one variant of [`Action`]. Callers submit an action with
//! the set of authorities that signed it; the ledger answers with a [`Receipt`]
//! or a [`LedgerError`].
//!
//! | Group | Actions | Signers |
//! |-------|---------|---------|
//! | Global config | `init`, `config`, `rotate`, `evacuate`, `migrate` | administrator |
//! | License catalog | `announce`, `activate`, `archive`, `empower`, `revoke` | administrator |
//! | Applications | `allocate` | administrator |
//! | Applications | `apply` | account + witness |
//! | Applications | `claim` | owner |
//! | Applications | `refuse` | owner, or administrator after expiry |
//! | Partners | `update`, `upgrade` | partner + witness |
//! | Partners | `insure`, `quit`, `prolong`, `withdraw` | partner |
//! | Partners | `failover` | standby |
//! | Partners | `delegate` | partner, or administrator after expiry |
//! | Partners | `suspend`, `resume`, `sync` | administrator |

use crate::domain::effects::{Created, Effect};
use crate::domain::entities::{
    Application, BrokerRequest, GlobalTtl, License, LicenseTerms, Partner, SyncEntry,
};
use crate::domain::state::LedgerState;
use crate::domain::value_objects::{
    ApplicationId, EntityRef, LicenseId, LicenseRate, PartnerId, Rate,
};
use crate::errors::LedgerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, Authority, TransferNotice, TransferRequest};
use std::collections::BTreeSet;
use uuid::Uuid;

/// An operation submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Init {
        locked: Asset,
        witness: Authority,
        ttl: GlobalTtl,
    },
    Config {
        ttl: GlobalTtl,
    },
    Rotate {
        witness: Authority,
    },
    Evacuate {
        reason: String,
    },
    Migrate {
        version: u64,
    },
    Announce {
        name: String,
        fee: Asset,
        rate: LicenseRate,
        terms: LicenseTerms,
    },
    Activate {
        license: LicenseId,
    },
    Archive {
        license: LicenseId,
        reason: String,
    },
    Empower {
        entity: EntityRef,
        capability: LicenseId,
        reason: String,
    },
    Revoke {
        entity: EntityRef,
        capability: LicenseId,
        reason: String,
    },
    Allocate {
        partner: AccountName,
        affiliate: Option<AccountName>,
        license: LicenseId,
        rate: Option<Rate>,
        discount: Asset,
        broker: Option<BrokerRequest>,
        #[serde(default)]
        approved: bool,
    },
    Apply {
        account: AccountName,
        license: LicenseId,
        rate: Option<Rate>,
        discount: Asset,
        broker: BrokerRequest,
    },
    Refuse {
        application: ApplicationId,
    },
    Claim {
        partner: AccountName,
    },
    Update {
        partner: AccountName,
        license: LicenseId,
        rate: Option<Rate>,
        balance: Option<Asset>,
    },
    Upgrade {
        partner: AccountName,
        from: LicenseId,
        to: LicenseId,
        rate: Option<Rate>,
    },
    Insure {
        partner: AccountName,
        standby: AccountName,
    },
    Failover {
        partner: AccountName,
    },
    Delegate {
        partner: AccountName,
        successor: AccountName,
    },
    Quit {
        partner: AccountName,
    },
    Prolong {
        partner: AccountName,
    },
    Withdraw {
        partner: AccountName,
        payee: AccountName,
        quantity: Asset,
    },
    Suspend {
        partner: AccountName,
        deal: Option<PartnerId>,
        reason: String,
    },
    Resume {
        partner: AccountName,
        deal: Option<PartnerId>,
        reason: String,
    },
    Sync {
        accounts: Vec<SyncEntry>,
    },
}

impl Action {
    /// Operation name, as used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Config { .. } => "config",
            Self::Rotate { .. } => "rotate",
            Self::Evacuate { .. } => "evacuate",
            Self::Migrate { .. } => "migrate",
            Self::Announce { .. } => "announce",
            Self::Activate { .. } => "activate",
            Self::Archive { .. } => "archive",
            Self::Empower { .. } => "empower",
            Self::Revoke { .. } => "revoke",
            Self::Allocate { .. } => "allocate",
            Self::Apply { .. } => "apply",
            Self::Refuse { .. } => "refuse",
            Self::Claim { .. } => "claim",
            Self::Update { .. } => "update",
            Self::Upgrade { .. } => "upgrade",
            Self::Insure { .. } => "insure",
            Self::Failover { .. } => "failover",
            Self::Delegate { .. } => "delegate",
            Self::Quit { .. } => "quit",
            Self::Prolong { .. } => "prolong",
            Self::Withdraw { .. } => "withdraw",
            Self::Suspend { .. } => "suspend",
            Self::Resume { .. } => "resume",
            Self::Sync { .. } => "sync",
        }
    }
}

/// Answer to a committed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub correlation_id: Uuid,
    pub action: String,
    pub created: Option<Created>,
    pub effects: Vec<Effect>,
}

/// Primary API of the ledger.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Runs `action` as one atomic unit.
    async fn submit(&self, signers: BTreeSet<Authority>, action: Action) -> LedgerResult<Receipt>;

    /// Reacts to a transfer that already happened on the token contract.
    async fn on_transfer(&self, notice: TransferNotice) -> LedgerResult<Receipt>;

    /// Executes a token transfer signed by `request.from` and delivers its
    /// notice to the ledger, as one atomic unit.
    async fn transfer(
        &self,
        signers: BTreeSet<Authority>,
        request: TransferRequest,
    ) -> LedgerResult<Receipt>;

    /// Committed state.
    async fn snapshot(&self) -> LedgerResult<LedgerState>;

    async fn license(&self, id: LicenseId) -> LedgerResult<Option<License>>;

    async fn partner(&self, account: &AccountName) -> LedgerResult<Option<Partner>>;

    async fn application(&self, owner: &AccountName) -> LedgerResult<Option<Application>>;

    /// Current `locked` amount, `None` if the ledger is not initialized.
    async fn locked(&self) -> LedgerResult<Option<Asset>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_shape() {
        let json = r#"{"action":"claim","partner":"alice"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action.name(), "claim");
        assert_eq!(
            action,
            Action::Claim {
                partner: AccountName::from_static("alice")
            }
        );
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"action":"allocate","partner":"bob","license":0,"discount":"0.0000 EOS"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        match action {
            Action::Allocate {
                affiliate,
                rate,
                broker,
                approved,
                ..
            } => {
                assert!(affiliate.is_none());
                assert!(rate.is_none());
                assert!(broker.is_none());
                assert!(!approved);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
