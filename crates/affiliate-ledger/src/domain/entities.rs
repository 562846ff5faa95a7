//! # Domain Entities
//!
//! Rows of the ledger tables and the singleton configuration record.
//!
//! ## Clusters
//!
//! - **Catalog**: `License`, `LicenseTerms`
//! - **Onboarding**: `Application`, `BrokerRequest`, `Broker`
//! - **Ledger**: `Partner`, `SyncEntry`
//! - **Config**: `GlobalConfig`, `GlobalTtl`

use crate::domain::value_objects::{
    ApplicationId, BrokerCursor, LicenseId, LicenseRate, PartnerId, Rate,
};
use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Asset, Authority, Timestamp};
use std::collections::BTreeMap;

/// Adds `secs` seconds to a millisecond timestamp.
#[must_use]
pub fn deadline(now: Timestamp, secs: u64) -> Timestamp {
    now.saturating_add(secs.saturating_mul(1_000))
}

// =============================================================================
// CATALOG
// =============================================================================

/// Terms attached to a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LicenseTerms {
    /// Platform cut in percent, below 100.
    pub platform_commission: u8,
    /// Only the administrator may hand this license out.
    pub privileged_access: bool,
    /// Public program (as opposed to an internal one).
    pub global_program: bool,
    /// Brokers are paid immediately when a referred application is claimed.
    pub instant_payout: bool,
    /// Licenses a holder of this license may broker.
    pub allowed_scope: Vec<LicenseId>,
    /// Referral window in seconds, non-negative.
    pub referral_ttl_secs: i64,
    pub additionable: bool,
    pub upgradable: bool,
    pub revocable: bool,
    pub franchise: bool,
}

impl LicenseTerms {
    /// Self-service operations may only touch public licenses.
    #[must_use]
    pub fn is_public(&self) -> bool {
        !self.privileged_access && self.global_program
    }
}

/// A revenue-share product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: LicenseId,
    pub name: String,
    /// Amount charged to join.
    pub fee: Asset,
    pub rate: LicenseRate,
    pub terms: LicenseTerms,
    pub active: bool,
    /// Terminal. An archived license is never reactivated.
    pub archived: bool,
}

impl License {
    /// True if holders of this license may broker `license`.
    #[must_use]
    pub fn allows(&self, license: LicenseId) -> bool {
        self.terms.allowed_scope.contains(&license)
    }

    /// Active and not archived.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.active && !self.archived
    }
}

// =============================================================================
// BROKERS
// =============================================================================

/// Broker reference as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerRequest {
    #[serde(rename = "self")]
    pub partner: BrokerCursor,
    #[serde(default)]
    pub root: Option<BrokerCursor>,
    /// License whose scope the broker attests membership in.
    pub license: LicenseId,
    pub rate: Rate,
    #[serde(default)]
    pub suspended: bool,
}

/// Broker reference resolved to partner ids, as stored on rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broker {
    pub partner: PartnerId,
    pub root: Option<PartnerId>,
    pub license: LicenseId,
    pub rate: Rate,
    /// Deal-level freeze, independent of the broker partner's own flag.
    pub suspended: bool,
}

// =============================================================================
// ONBOARDING
// =============================================================================

/// A pending signup awaiting its deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub owner: AccountName,
    pub affiliate: Option<AccountName>,
    pub license: LicenseId,
    pub rate: Option<Rate>,
    /// License fee at creation time.
    pub fee: Asset,
    pub discount: Asset,
    pub deposit: Asset,
    pub broker: Option<Broker>,
    pub eol: Timestamp,
}

impl Application {
    /// `fee - discount`.
    pub fn payable_fee(&self) -> Result<Asset, LedgerError> {
        self.fee
            .checked_sub(self.discount)
            .map_err(|_| LedgerError::InvariantViolation("discount exceeds fee".into()))
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// An onboarded partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    /// Controlling account.
    pub primary: AccountName,
    /// Succession account.
    pub standby: Option<AccountName>,
    pub affiliate: Option<AccountName>,
    /// Licenses this partner may invoke, with the negotiated rate if any.
    pub contracts: BTreeMap<LicenseId, Option<Rate>>,
    /// Signed; negative right after joining when the fee exceeds the discount.
    pub balance: Asset,
    pub broker: Option<Broker>,
    pub suspended: bool,
    /// Rolling expiry, refreshed by `prolong`.
    pub eol: Timestamp,
}

impl Partner {
    #[must_use]
    pub fn holds(&self, license: LicenseId) -> bool {
        self.contracts.contains_key(&license)
    }

    /// Root of this partner's broker chain, if any.
    #[must_use]
    pub fn broker_root(&self) -> Option<PartnerId> {
        self.broker.as_ref().and_then(|b| b.root)
    }
}

/// One line of an administrative `sync` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub owner: AccountName,
    pub license: LicenseId,
    /// Signed balance delta.
    pub saldo: Asset,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Time windows, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTtl {
    /// Partner inactivity window.
    pub safeguard: u64,
    /// Pending-application expiry window.
    pub application: u64,
}

impl GlobalTtl {
    /// Both windows must be at least one second.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.safeguard == 0 {
            return Err(LedgerError::NonPositiveTtl { which: "safeguard" });
        }
        if self.application == 0 {
            return Err(LedgerError::NonPositiveTtl {
                which: "application",
            });
        }
        Ok(())
    }
}

/// Singleton configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub version: u64,
    /// Funds this ledger must keep reserved in custody.
    pub locked: Asset,
    /// Second signer required for partner self-service actions.
    pub witness: Authority,
    pub last_sync: Timestamp,
    pub ttl: GlobalTtl,
}
