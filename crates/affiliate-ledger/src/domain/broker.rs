//! # Broker Resolution
//!
//! Turns a caller-supplied [`BrokerRequest`] into a stored [`Broker`] with
//! partner ids, and checks the broker is entitled to refer `target`.
//!
//! 1. `self` resolves to a partner (by id or primary account).
//! 2. `root`, if present, resolves to a partner with no root of its own.
//! 3. The broker license exists, the broker is not suspended, holds that
//!    license, and the license scope contains `target`.
//! 4. The quoted rate lies within a peer-to-peer range, or equals the rate the
//!    broker negotiated for any other shape.

use crate::domain::entities::{Broker, BrokerRequest};
use crate::domain::ledger::Ledger;
use crate::domain::value_objects::{LicenseId, RateLimit};
use crate::errors::{LedgerError, LedgerResult};

impl Ledger<'_> {
    /// Resolves and validates a broker reference for an action on `target`.
    #[allow(clippy::float_cmp)]
    pub fn resolve_broker(&self, request: &BrokerRequest, target: LicenseId) -> LedgerResult<Broker> {
        let broker = self
            .find_partner(&request.partner)
            .ok_or(LedgerError::BrokerMissing)?;

        let root = match &request.root {
            Some(cursor) => {
                let root = self
                    .find_partner(cursor)
                    .ok_or(LedgerError::BrokerRootMissing)?;
                if root.broker_root().is_some() {
                    return Err(LedgerError::BrokerRootMalformed);
                }
                Some(root.id)
            }
            None => None,
        };

        let license = self.license(request.license, LedgerError::InvalidBrokerLicense)?;

        if broker.suspended {
            return Err(LedgerError::SuspendedBroker);
        }
        if !broker.holds(request.license) {
            return Err(LedgerError::BrokerLicenseSpoofing);
        }
        if !license.allows(target) {
            return Err(LedgerError::BrokerOutOfScope);
        }

        match license.rate.limit {
            RateLimit::PeerToPeer { from, to } => {
                if request.rate < from || request.rate > to {
                    return Err(LedgerError::BrokerRateOutOfRange { from, to });
                }
            }
            RateLimit::Fixed { .. } | RateLimit::Range { .. } => {
                let on_file = broker
                    .contracts
                    .get(&request.license)
                    .copied()
                    .flatten()
                    .ok_or(LedgerError::InvalidBrokerLicense)?;
                if request.rate != on_file {
                    return Err(LedgerError::BrokerRateMustEqual { expected: on_file });
                }
            }
        }

        Ok(Broker {
            partner: broker.id,
            root,
            license: request.license,
            rate: request.rate,
            suspended: request.suspended,
        })
    }
}
