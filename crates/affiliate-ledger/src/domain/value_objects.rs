//! # Value Objects
//!
//! Identifiers, rate schedules and the tagged references used across tables.

use crate::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::AccountName;
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw key.
            #[must_use]
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

table_id!(
    /// Primary key of the license table.
    LicenseId
);
table_id!(
    /// Primary key of the application table.
    ApplicationId
);
table_id!(
    /// Primary key of the partner table.
    PartnerId
);

// =============================================================================
// RATES
// =============================================================================

/// Revenue-share fraction in `(0, 1)`.
pub type Rate = f64;

/// Shape of a license's rate schedule.
///
/// The shape is fixed at announce time and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateLimit {
    /// Every contract carries exactly this rate.
    Fixed { value: Rate },
    /// Each contract negotiates a rate within `[from, to]`.
    Range { from: Rate, to: Rate },
    /// Contracts carry no rate; brokers quote one within `[from, to]` per deal.
    PeerToPeer { from: Rate, to: Rate },
}

impl RateLimit {
    /// True if `self` and `other` are the same variant.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Short label of the shape.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Range { .. } => "range",
            Self::PeerToPeer { .. } => "p2p",
        }
    }

    /// Checks the schedule itself is well-formed.
    ///
    /// Fixed and range schedules always store a rate on every contract, so
    /// they cannot be granted as rate-less additional contracts.
    pub fn validate(&self, additionable: bool) -> Result<(), LedgerError> {
        let in_unit = |r: Rate| r > 0.0 && r < 1.0;
        match *self {
            Self::Fixed { value } => {
                if !in_unit(value) {
                    return Err(LedgerError::FixedRateOutOfBounds);
                }
                if additionable {
                    return Err(LedgerError::RateLimitNotAdditionable);
                }
            }
            Self::Range { from, to } => {
                if !in_unit(from) || !in_unit(to) {
                    return Err(LedgerError::RangeRateOutOfBounds);
                }
                if from >= to {
                    return Err(LedgerError::InvalidRateRange);
                }
                if additionable {
                    return Err(LedgerError::RateLimitNotAdditionable);
                }
            }
            Self::PeerToPeer { from, to } => {
                if !in_unit(from) || !in_unit(to) {
                    return Err(LedgerError::PeerRateOutOfBounds);
                }
                if from >= to {
                    return Err(LedgerError::InvalidPeerRateRange);
                }
            }
        }
        Ok(())
    }

    /// Checks a contract rate supplied by a caller against this schedule.
    ///
    /// `Fixed` requires exactly the fixed value, `Range` a value within the
    /// bounds (inclusive), `PeerToPeer` no value at all.
    #[allow(clippy::float_cmp)]
    pub fn check_contract_rate(&self, rate: Option<Rate>) -> Result<(), LedgerError> {
        match (*self, rate) {
            (Self::Fixed { value }, Some(r)) if r == value => Ok(()),
            (Self::Fixed { value }, _) => Err(LedgerError::RateMustEqual { expected: value }),
            (Self::Range { from, to }, Some(r)) if r >= from && r <= to => Ok(()),
            (Self::Range { from, to }, _) => Err(LedgerError::RateOutOfRange { from, to }),
            (Self::PeerToPeer { .. }, None) => Ok(()),
            (Self::PeerToPeer { .. }, Some(_)) => Err(LedgerError::RateMustBeUnspecified),
        }
    }
}

/// Who bears the license rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePayer {
    Partner,
    Platform,
}

impl TryFrom<u8> for RatePayer {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Partner),
            1 => Ok(Self::Platform),
            _ => Err(LedgerError::InvalidRatePayer),
        }
    }
}

/// Rate schedule of a license.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LicenseRate {
    pub payer: RatePayer,
    pub limit: RateLimit,
}

// =============================================================================
// REFERENCES
// =============================================================================

/// Names a partner either by internal id or by its primary account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerCursor {
    Id(PartnerId),
    Account(AccountName),
}

/// Target of a capability grant or revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// Extend or shrink the license's allowed scope.
    License(LicenseId),
    /// Add or remove an ad-hoc contract on the partner.
    Partner(AccountName),
}
