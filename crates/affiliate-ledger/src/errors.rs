//! # Error Types
//!
//! Every rejection the ledger can produce. Each failed precondition has its own
//! variant and message; [`LedgerError::class`] groups them for callers that only
//! care about remediation.

use shared_types::{AccountName, Asset, AssetError, Authority};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// ERROR CLASSES
// =============================================================================

/// Remediation class of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed input. Caller-fixable.
    Validation,
    /// A required signer is missing.
    Authorization,
    /// Forged, stale or logically inconsistent reference.
    Consistency,
    /// Not enough funds, or the deadline has not passed yet.
    Resource,
    /// The request would not change anything.
    Redundancy,
}

impl ErrorClass {
    /// Stable lower-case label, used as a metrics label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Consistency => "consistency",
            Self::Resource => "resource",
            Self::Redundancy => "redundancy",
        }
    }
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors returned by ledger operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    // ---- validation ----
    /// Asset is malformed, in the wrong symbol, or outside the allowed bounds.
    #[error("invalid {what} {asset}: {reason}")]
    InvalidAsset {
        what: &'static str,
        asset: Asset,
        reason: &'static str,
    },

    #[error("license name must not be empty")]
    EmptyLicenseName,

    #[error("invalid rate payer")]
    InvalidRatePayer,

    #[error("rate must be greater than zero and less than one")]
    FixedRateOutOfBounds,

    #[error("rate range must be greater than zero and less than one")]
    RangeRateOutOfBounds,

    #[error("invalid rate range")]
    InvalidRateRange,

    #[error("p2p rate range must be greater than zero and less than one")]
    PeerRateOutOfBounds,

    #[error("invalid p2p rate range")]
    InvalidPeerRateRange,

    #[error("rate limit terms not met (license cannot be additionable)")]
    RateLimitNotAdditionable,

    #[error("commission percentage must be below 100")]
    CommissionTooHigh,

    #[error("referral ttl must be non-negative")]
    NegativeReferralTtl,

    /// A franchise license asked for a forbidden term.
    #[error("franchise terms not met (license cannot be {0})")]
    FranchiseTermsViolated(&'static str),

    #[error("rate value must be equal to {expected}")]
    RateMustEqual { expected: f64 },

    #[error("rate value must be in range from {from} to {to} (incl.)")]
    RateOutOfRange { from: f64, to: f64 },

    #[error("rate value must be unspecified")]
    RateMustBeUnspecified,

    #[error("broker rate value must be equal to {expected}")]
    BrokerRateMustEqual { expected: f64 },

    #[error("broker rate value must be in range from {from} to {to} (incl.)")]
    BrokerRateOutOfRange { from: f64, to: f64 },

    #[error("reason must be stated")]
    ReasonRequired,

    /// `which` is `safeguard` or `application`.
    #[error("{which} ttl must be positive")]
    NonPositiveTtl { which: &'static str },

    #[error("{account} account does not exist")]
    AccountMissing { account: AccountName },

    #[error("witness account does not exist")]
    WitnessAccountMissing,

    #[error("payee account does not exist")]
    PayeeMissing,

    #[error("memo must be empty (spam protection)")]
    SpamMemo,

    #[error("invalid version")]
    UnknownVersion,

    // ---- authorization ----
    #[error("missing required authority of {account}")]
    MissingAuthority { account: AccountName },

    #[error("missing required authority of {first} or {second}")]
    MissingEitherAuthority {
        first: AccountName,
        second: AccountName,
    },

    #[error("missing required authority of witness {witness}")]
    MissingWitness { witness: Authority },

    #[error("missing required authority for such license")]
    PrivilegedLicense,

    #[error("missing required authority for such target license")]
    PrivilegedTargetLicense,

    // ---- consistency ----
    #[error("already initialized")]
    AlreadyInitialized,

    #[error("ledger is not initialized")]
    NotInitialized,

    #[error("invalid license")]
    InvalidLicense,

    #[error("invalid current license")]
    InvalidCurrentLicense,

    #[error("invalid target license")]
    InvalidTargetLicense,

    #[error("invalid object")]
    InvalidObject,

    #[error("invalid capability")]
    InvalidCapability,

    #[error("invalid license scope")]
    InvalidLicenseScope,

    #[error("usage of inactive license")]
    InactiveLicense,

    #[error("usage of archived license")]
    ArchivedLicense,

    #[error("target license is inactive")]
    InactiveTargetLicense,

    #[error("target license is archived")]
    ArchivedTargetLicense,

    #[error("internal license is not allowed")]
    InternalLicense,

    #[error("franchise terms not met")]
    FranchiseMismatch,

    #[error("prevention of privilege escalation")]
    PrivilegeEscalation,

    #[error("intersection of different types of programs")]
    ProgramTypeMismatch,

    #[error("modification of active license")]
    ActiveLicenseModification,

    #[error("modification of archived license")]
    ArchivedLicenseModification,

    #[error("modification of suspended partner")]
    SuspendedPartnerModification,

    #[error("assignment of archived capability")]
    ArchivedCapability,

    #[error("assignment of inactive capability")]
    InactiveCapability,

    #[error("misappropriation of capability")]
    CapabilityMisappropriation,

    #[error("removal of irrevocable capability")]
    IrrevocableCapability,

    #[error("broker does not exist")]
    BrokerMissing,

    #[error("broker root does not exist")]
    BrokerRootMissing,

    #[error("broker root is malformed")]
    BrokerRootMalformed,

    #[error("invalid broker license")]
    InvalidBrokerLicense,

    #[error("usage of suspended broker")]
    SuspendedBroker,

    #[error("broker license spoofing")]
    BrokerLicenseSpoofing,

    #[error("broker is out of scope")]
    BrokerOutOfScope,

    #[error("application does not exist")]
    ApplicationMissing,

    #[error("partner does not exist")]
    PartnerMissing,

    #[error("usage of suspended partner")]
    SuspendedPartner,

    #[error("license spoofing")]
    LicenseSpoofing,

    #[error("current license spoofing")]
    CurrentLicenseSpoofing,

    #[error("license terms not met (rate is not updatable due to limit type)")]
    RateNotUpdatable,

    #[error("upgrade terms not met (rate limit types are not consistent)")]
    InconsistentRateLimits,

    #[error("current license is non-upgradable")]
    NonUpgradableLicense,

    #[error("license downgrade is not allowed")]
    LicenseDowngrade,

    #[error("deal does not exist")]
    DealMissing,

    #[error("invalid deal")]
    InvalidDeal,

    #[error("inconsistent data")]
    InconsistentDeal,

    #[error("standby account not set")]
    StandbyNotSet,

    #[error("{account} account is already in use")]
    AccountInUse { account: AccountName },

    #[error("affiliate {affiliate} is already declared")]
    AffiliateDeclared { affiliate: AccountName },

    #[error("no viable target")]
    NoViableTarget,

    #[error("version downgrade is not supported")]
    VersionDowngrade,

    /// A `sync` entry failed; the whole batch is rejected.
    #[error("{source} ({owner})")]
    SyncEntry {
        owner: AccountName,
        source: Box<LedgerError>,
    },

    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// A post-operation invariant check failed.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Balance arithmetic left the representable range.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] AssetError),

    // ---- resource ----
    #[error("deposit is not enough to cover fee")]
    DepositNotEnough,

    #[error("balance is not enough to cover upgrade fee")]
    UpgradeFeeNotCovered,

    #[error("application has not expired")]
    ApplicationNotExpired,

    #[error("partner account has not expired")]
    PartnerNotExpired,

    #[error("overdraft is not allowed")]
    Overdraft,

    #[error("treasury error: {0}")]
    Treasury(#[from] TreasuryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    // ---- redundancy ----
    #[error("redundant action")]
    Redundant,
}

impl LedgerError {
    /// Remediation class of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        use LedgerError as E;
        match self {
            E::InvalidAsset { .. }
            | E::EmptyLicenseName
            | E::InvalidRatePayer
            | E::FixedRateOutOfBounds
            | E::RangeRateOutOfBounds
            | E::InvalidRateRange
            | E::PeerRateOutOfBounds
            | E::InvalidPeerRateRange
            | E::RateLimitNotAdditionable
            | E::CommissionTooHigh
            | E::NegativeReferralTtl
            | E::FranchiseTermsViolated(_)
            | E::RateMustEqual { .. }
            | E::RateOutOfRange { .. }
            | E::RateMustBeUnspecified
            | E::BrokerRateMustEqual { .. }
            | E::BrokerRateOutOfRange { .. }
            | E::ReasonRequired
            | E::NonPositiveTtl { .. }
            | E::AccountMissing { .. }
            | E::WitnessAccountMissing
            | E::PayeeMissing
            | E::SpamMemo
            | E::UnknownVersion => ErrorClass::Validation,

            E::MissingAuthority { .. }
            | E::MissingEitherAuthority { .. }
            | E::MissingWitness { .. }
            | E::PrivilegedLicense
            | E::PrivilegedTargetLicense => ErrorClass::Authorization,

            E::DepositNotEnough
            | E::UpgradeFeeNotCovered
            | E::ApplicationNotExpired
            | E::PartnerNotExpired
            | E::Overdraft
            | E::Treasury(_)
            | E::Store(_) => ErrorClass::Resource,

            E::Redundant => ErrorClass::Redundancy,

            E::SyncEntry { source, .. } => source.class(),

            _ => ErrorClass::Consistency,
        }
    }

    /// Wraps `self` with the owner of the failed `sync` entry.
    #[must_use]
    pub fn for_sync_entry(self, owner: &AccountName) -> Self {
        Self::SyncEntry {
            owner: owner.clone(),
            source: Box::new(self),
        }
    }
}

// =============================================================================
// TABLE ERRORS
// =============================================================================

/// Secondary-index violations raised by the keyed tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A unique index already holds the key.
    #[error("duplicate key {key} in index {index}")]
    DuplicateKey { index: &'static str, key: String },

    /// Primary key is already taken.
    #[error("duplicate primary key {0}")]
    DuplicatePrimaryKey(u64),

    /// Row to modify does not exist.
    #[error("row {0} does not exist")]
    MissingRow(u64),
}

// =============================================================================
// PORT ERRORS
// =============================================================================

/// Errors from the transfer executor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    /// Paying account cannot cover the transfer.
    #[error("insufficient funds on {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: AccountName,
        required: Asset,
        available: Asset,
    },

    /// Receiving account does not exist.
    #[error("recipient {0} does not exist")]
    UnknownRecipient(AccountName),

    /// Transfer quantity is not positive or in the wrong symbol.
    #[error("invalid transfer quantity {0}")]
    InvalidQuantity(Asset),

    /// Backend failure.
    #[error("treasury unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the state store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Persisted state could not be decoded (including index corruption).
    #[error("corrupt state: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}
