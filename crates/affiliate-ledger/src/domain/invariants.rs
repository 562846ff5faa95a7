//! # Domain Invariants
//!
//! Properties that must hold after every committed operation. The executor
//! checks them before handing an outcome back; a violation aborts the unit.
//!
//! - Custody cover: `sum(max(balance, 0)) + sum(deposit) <= locked`
//! - Unique accounts: an account is a partner primary, a partner standby or
//!   an application owner, never two of these at once
//! - Broker depth: a broker root never has a root of its own

use crate::domain::state::LedgerState;
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Custody cover. Vacuous while the ledger is not initialized.
#[must_use]
pub fn check_custody_invariant(state: &LedgerState) -> Option<InvariantViolation> {
    let config = state.config.as_ref()?;
    let balances: i128 = state
        .partners
        .iter()
        .map(|p| i128::from(p.balance.amount.max(0)))
        .sum();
    let deposits: i128 = state
        .applications
        .iter()
        .map(|a| i128::from(a.deposit.amount))
        .sum();
    let reserved = balances + deposits;
    if reserved > i128::from(config.locked.amount) {
        return Some(InvariantViolation::CustodyUncovered {
            reserved,
            locked: config.locked.amount,
        });
    }
    None
}

/// Unique accounts across primaries, standbys and application owners.
#[must_use]
pub fn check_unique_accounts_invariant(state: &LedgerState) -> Option<InvariantViolation> {
    let mut seen = BTreeSet::new();
    let accounts = state
        .partners
        .iter()
        .flat_map(|p| std::iter::once(&p.primary).chain(p.standby.as_ref()))
        .chain(state.applications.iter().map(|a| &a.owner));
    for account in accounts {
        if !seen.insert(account) {
            return Some(InvariantViolation::AccountReused(account.to_string()));
        }
    }
    None
}

/// Broker hierarchies are at most two levels deep.
#[must_use]
pub fn check_broker_depth_invariant(state: &LedgerState) -> Option<InvariantViolation> {
    // A partner that roots a chain must not hang under a root itself.
    state
        .partners
        .iter()
        .filter(|root| root.broker_root().is_some())
        .find_map(|root| state.partners.under_root(root.id).next())
        .map(|p| InvariantViolation::BrokerTooDeep(p.id.value()))
}

/// Check all invariants at once.
pub fn check_all_invariants(state: &LedgerState) -> Result<(), Vec<InvariantViolation>> {
    let violations: Vec<_> = [
        check_custody_invariant(state),
        check_unique_accounts_invariant(state),
        check_broker_depth_invariant(state),
    ]
    .into_iter()
    .flatten()
    .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Reserved funds exceed `locked`.
    CustodyUncovered { reserved: i128, locked: i64 },
    /// Account used in more than one role.
    AccountReused(String),
    /// Partner whose broker root has a root itself.
    BrokerTooDeep(u64),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustodyUncovered { reserved, locked } => {
                write!(f, "reserved funds {reserved} exceed locked {locked}")
            }
            Self::AccountReused(account) => write!(f, "account {account} used twice"),
            Self::BrokerTooDeep(id) => write!(f, "broker chain of partner {id} is too deep"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Application, Broker, GlobalConfig, GlobalTtl, Partner};
    use crate::domain::value_objects::{ApplicationId, LicenseId, PartnerId};
    use shared_types::{AccountName, Asset, Authority, Symbol};
    use std::collections::BTreeMap;

    fn eos(amount: i64) -> Asset {
        Asset::new(amount, Symbol::EOS).unwrap()
    }

    fn state_with_locked(locked: i64) -> LedgerState {
        LedgerState {
            config: Some(GlobalConfig {
                version: 0,
                locked: eos(locked),
                witness: Authority::active(AccountName::from_static("witness")),
                last_sync: 0,
                ttl: GlobalTtl {
                    safeguard: 60,
                    application: 60,
                },
            }),
            ..LedgerState::default()
        }
    }

    fn partner(id: u64, primary: &str, balance: i64) -> Partner {
        Partner {
            id: PartnerId(id),
            primary: AccountName::new(primary).unwrap(),
            standby: None,
            affiliate: None,
            contracts: BTreeMap::new(),
            balance: eos(balance),
            broker: None,
            suspended: false,
            eol: 0,
        }
    }

    #[test]
    fn test_custody_ignores_negative_balances() {
        let mut state = state_with_locked(100);
        state.partners.insert(partner(0, "alice", 100)).unwrap();
        state.partners.insert(partner(1, "bob", -500)).unwrap();
        assert!(check_all_invariants(&state).is_ok());
    }

    #[test]
    fn test_custody_counts_deposits() {
        let mut state = state_with_locked(100);
        state.partners.insert(partner(0, "alice", 60)).unwrap();
        state
            .applications
            .insert(Application {
                id: ApplicationId(0),
                owner: AccountName::from_static("carol"),
                affiliate: None,
                license: LicenseId(0),
                rate: None,
                fee: eos(100),
                discount: eos(0),
                deposit: eos(50),
                broker: None,
                eol: 0,
            })
            .unwrap();
        assert_eq!(
            check_custody_invariant(&state),
            Some(InvariantViolation::CustodyUncovered {
                reserved: 110,
                locked: 100
            })
        );
    }

    #[test]
    fn test_uninitialized_state_skips_custody() {
        let mut state = LedgerState::default();
        state.partners.insert(partner(0, "alice", 60)).unwrap();
        assert!(check_custody_invariant(&state).is_none());
    }

    #[test]
    fn test_standby_cannot_be_another_primary() {
        let mut state = state_with_locked(0);
        state.partners.insert(partner(0, "alice", 0)).unwrap();
        let mut bob = partner(1, "bob", 0);
        bob.standby = Some(AccountName::from_static("alice"));
        state.partners.insert(bob).unwrap();
        assert_eq!(
            check_unique_accounts_invariant(&state),
            Some(InvariantViolation::AccountReused("alice".into()))
        );
    }

    fn brokered_by(mut p: Partner, broker: u64, root: Option<u64>) -> Partner {
        p.broker = Some(Broker {
            partner: PartnerId(broker),
            root: root.map(PartnerId),
            license: LicenseId(0),
            rate: 0.1,
            suspended: false,
        });
        p
    }

    #[test]
    fn test_broker_chain_depth() {
        let mut state = state_with_locked(0);
        state.partners.insert(partner(0, "alice", 0)).unwrap();
        state
            .partners
            .insert(brokered_by(partner(1, "bob", 0), 0, Some(0)))
            .unwrap();
        assert!(check_broker_depth_invariant(&state).is_none());

        state
            .partners
            .insert(brokered_by(partner(2, "carol", 0), 1, Some(1)))
            .unwrap();
        assert_eq!(
            check_broker_depth_invariant(&state),
            Some(InvariantViolation::BrokerTooDeep(2))
        );
    }
}
