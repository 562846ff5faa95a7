//! # Ledger Executor
//!
//! Runs one operation against a working copy of the state.
//!
//! A [`Ledger`] borrows the working state, the deployment settings, a view of
//! the host chain and the signing context. Operations are split over the
//! component modules (`license_catalog`, `scope`, `broker`, `applications`,
//! `partners`, `global_config`, `notifications`), each adding an `impl` block.
//!
//! Operations never perform side effects themselves: transfers and
//! notifications are collected as [`Effect`]s and handed back in the
//! [`Outcome`]. If anything fails the caller drops the working copy.

use crate::config::LedgerConfig;
use crate::domain::effects::{Created, Effect, Outcome};
use crate::domain::entities::{GlobalConfig, License, Partner};
use crate::domain::invariants::check_all_invariants;
use crate::domain::state::LedgerState;
use crate::domain::value_objects::{BrokerCursor, LicenseId};
use crate::errors::{LedgerError, LedgerResult};
use crate::ports::inbound::Action;
use crate::ports::outbound::ChainHost;
use shared_types::{
    AccountName, Asset, Authority, Timestamp, TransferRequest, MAX_ASSET_AMOUNT,
};
use std::collections::BTreeSet;

/// Who signed the operation, and when it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub signers: BTreeSet<Authority>,
    pub now: Timestamp,
}

impl ActionContext {
    #[must_use]
    pub fn new(signers: BTreeSet<Authority>, now: Timestamp) -> Self {
        Self { signers, now }
    }

    /// True if any permission of `account` signed.
    #[must_use]
    pub fn has_auth(&self, account: &AccountName) -> bool {
        self.signers.iter().any(|s| &s.actor == account)
    }

    /// True if exactly `authority` signed.
    #[must_use]
    pub fn has_authority(&self, authority: &Authority) -> bool {
        self.signers.contains(authority)
    }
}

/// Executor of a single operation.
pub struct Ledger<'a> {
    pub(crate) state: &'a mut LedgerState,
    pub(crate) settings: &'a LedgerConfig,
    pub(crate) chain: &'a dyn ChainHost,
    pub(crate) ctx: &'a ActionContext,
    /// Transfers that settle together with this unit but were not emitted by it.
    pending: Vec<TransferRequest>,
    effects: Vec<Effect>,
    created: Option<Created>,
}

impl<'a> Ledger<'a> {
    pub fn new(
        state: &'a mut LedgerState,
        settings: &'a LedgerConfig,
        chain: &'a dyn ChainHost,
        ctx: &'a ActionContext,
    ) -> Self {
        Self {
            state,
            settings,
            chain,
            ctx,
            pending: Vec::new(),
            effects: Vec::new(),
            created: None,
        }
    }

    /// Dispatches `action` to its operation.
    pub fn execute(mut self, action: Action) -> LedgerResult<Outcome> {
        match action {
            Action::Init {
                locked,
                witness,
                ttl,
            } => self.init(locked, witness, ttl)?,
            Action::Config { ttl } => self.configure(ttl)?,
            Action::Rotate { witness } => self.rotate(witness)?,
            Action::Evacuate { reason } => self.evacuate(&reason)?,
            Action::Migrate { version } => self.migrate(version)?,
            Action::Announce {
                name,
                fee,
                rate,
                terms,
            } => {
                let id = self.announce(name, fee, rate, terms)?;
                self.created = Some(Created::License(id));
            }
            Action::Activate { license } => self.activate(license)?,
            Action::Archive { license, reason } => self.archive(license, &reason)?,
            Action::Empower {
                entity,
                capability,
                reason,
            } => self.empower(&entity, capability, &reason)?,
            Action::Revoke {
                entity,
                capability,
                reason,
            } => self.revoke(&entity, capability, &reason)?,
            Action::Allocate {
                partner,
                affiliate,
                license,
                rate,
                discount,
                broker,
                approved,
            } => {
                let created = self.allocate(
                    partner,
                    affiliate,
                    license,
                    rate,
                    discount,
                    broker.as_ref(),
                    approved,
                )?;
                self.created = Some(created);
            }
            Action::Apply {
                account,
                license,
                rate,
                discount,
                broker,
            } => {
                let id = self.apply(account, license, rate, discount, &broker)?;
                self.created = Some(Created::Application(id));
            }
            Action::Refuse { application } => self.refuse(application)?,
            Action::Claim { partner } => {
                let id = self.claim(&partner)?;
                self.created = Some(Created::Partner(id));
            }
            Action::Update {
                partner,
                license,
                rate,
                balance,
            } => self.update(&partner, license, rate, balance)?,
            Action::Upgrade {
                partner,
                from,
                to,
                rate,
            } => self.upgrade(&partner, from, to, rate)?,
            Action::Insure { partner, standby } => self.insure(&partner, standby)?,
            Action::Failover { partner } => self.failover(&partner)?,
            Action::Delegate { partner, successor } => self.delegate(&partner, successor)?,
            Action::Quit { partner } => self.quit(&partner)?,
            Action::Prolong { partner } => self.prolong(&partner)?,
            Action::Withdraw {
                partner,
                payee,
                quantity,
            } => self.withdraw(&partner, payee, quantity)?,
            Action::Suspend {
                partner,
                deal,
                reason,
            } => self.set_suspended(&partner, deal, &reason, true)?,
            Action::Resume {
                partner,
                deal,
                reason,
            } => self.set_suspended(&partner, deal, &reason, false)?,
            Action::Sync { accounts } => self.sync(&accounts)?,
        }
        self.finish()
    }

    /// Registers transfers that settle in the same unit (e.g. the transfer a
    /// notice describes) so balance checks see their effect.
    #[must_use]
    pub fn with_pending(mut self, pending: Vec<TransferRequest>) -> Self {
        self.pending = pending;
        self
    }

    /// Closes the unit: custody cover for outbound transfers, then invariants.
    pub(crate) fn finish(self) -> LedgerResult<Outcome> {
        let custody = &self.settings.custody_account;
        let pays_out = self
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Transfer(t) if &t.from == custody));
        if pays_out {
            self.check_custody_cover()?;
        }

        if let Err(violations) = check_all_invariants(self.state) {
            let joined = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(LedgerError::InvariantViolation(joined));
        }

        Ok(Outcome {
            created: self.created,
            effects: self.effects,
        })
    }

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================

    pub(crate) fn require_auth(&self, account: &AccountName) -> LedgerResult<()> {
        if self.ctx.has_auth(account) {
            Ok(())
        } else {
            Err(LedgerError::MissingAuthority {
                account: account.clone(),
            })
        }
    }

    /// The administrator is the ledger account itself.
    pub(crate) fn require_admin(&self) -> LedgerResult<()> {
        self.require_auth(&self.settings.ledger_account)
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.ctx.has_auth(&self.settings.ledger_account)
    }

    pub(crate) fn require_witness(&self) -> LedgerResult<()> {
        let witness = &self.config()?.witness;
        if self.ctx.has_authority(witness) {
            Ok(())
        } else {
            Err(LedgerError::MissingWitness {
                witness: witness.clone(),
            })
        }
    }

    /// Admin or `account`; the admin alone only once `eol` has passed.
    pub(crate) fn require_owner_or_expired_admin(
        &self,
        account: &AccountName,
        eol: Timestamp,
        not_expired: LedgerError,
    ) -> LedgerResult<()> {
        let by_admin = self.is_admin();
        let by_owner = self.ctx.has_auth(account);
        if !by_admin && !by_owner {
            return Err(LedgerError::MissingEitherAuthority {
                first: self.settings.ledger_account.clone(),
                second: account.clone(),
            });
        }
        if by_admin && !by_owner && self.ctx.now < eol {
            return Err(not_expired);
        }
        Ok(())
    }

    // =========================================================================
    // LOOKUPS AND CHECKS
    // =========================================================================

    pub(crate) fn config(&self) -> LedgerResult<&GlobalConfig> {
        self.state.config()
    }

    pub(crate) fn require_account(&self, account: &AccountName) -> LedgerResult<()> {
        if self.chain.account_exists(account) {
            Ok(())
        } else {
            Err(LedgerError::AccountMissing {
                account: account.clone(),
            })
        }
    }

    /// Checks `asset` is well-formed, in the ledger symbol and within `[min, max]`.
    pub(crate) fn check_asset(
        &self,
        what: &'static str,
        asset: Asset,
        min: i64,
        max: i64,
    ) -> LedgerResult<()> {
        let reject = |reason| LedgerError::InvalidAsset {
            what,
            asset,
            reason,
        };
        if !asset.is_valid() {
            return Err(reject("amount out of range"));
        }
        if asset.symbol != self.settings.symbol {
            return Err(reject("symbol mismatch"));
        }
        if asset.amount < min {
            return Err(reject("amount below minimum"));
        }
        if asset.amount > max {
            return Err(reject("amount above maximum"));
        }
        Ok(())
    }

    /// Checks a well-formed non-negative amount.
    pub(crate) fn check_non_negative(&self, what: &'static str, asset: Asset) -> LedgerResult<()> {
        self.check_asset(what, asset, 0, MAX_ASSET_AMOUNT)
    }

    /// An account may back at most one partner or application, in any role.
    pub(crate) fn check_unused_account(&self, account: &AccountName) -> LedgerResult<()> {
        if self.state.applications.has_owner(account)
            || self.state.partners.has_primary(account)
            || self.state.partners.has_standby(account)
        {
            return Err(LedgerError::AccountInUse {
                account: account.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_unused_affiliate(&self, affiliate: &AccountName) -> LedgerResult<()> {
        if self.state.applications.has_affiliate(affiliate)
            || self.state.partners.has_affiliate(affiliate)
        {
            return Err(LedgerError::AffiliateDeclared {
                affiliate: affiliate.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn license(&self, id: LicenseId, missing: LedgerError) -> LedgerResult<&License> {
        self.state.licenses.get(id).ok_or(missing)
    }

    pub(crate) fn partner_by_account(&self, account: &AccountName) -> LedgerResult<&Partner> {
        self.state
            .partners
            .find_by_primary(account)
            .ok_or(LedgerError::PartnerMissing)
    }

    pub(crate) fn find_partner(&self, cursor: &BrokerCursor) -> Option<&Partner> {
        match cursor {
            BrokerCursor::Id(id) => self.state.partners.get(*id),
            BrokerCursor::Account(account) => self.state.partners.find_by_primary(account),
        }
    }

    pub(crate) fn zero(&self) -> Asset {
        Asset::zero(self.settings.symbol)
    }

    // =========================================================================
    // CUSTODY
    // =========================================================================

    /// Adds a signed change to `locked`, flooring at zero.
    pub(crate) fn adjust_locked(&mut self, change: Asset) -> LedgerResult<()> {
        let config = self.state.config_mut()?;
        config.locked = crate::domain::custody::adjust(config.locked, change)?;
        Ok(())
    }

    /// Subtracts `amount` from `locked`, flooring at zero.
    pub(crate) fn release_locked(&mut self, amount: Asset) -> LedgerResult<()> {
        let config = self.state.config_mut()?;
        config.locked = crate::domain::custody::release(config.locked, amount)?;
        Ok(())
    }

    /// Balance of `account` once the pending and scheduled transfers settle.
    pub(crate) fn projected_balance(&self, account: &AccountName) -> Asset {
        let symbol = self.settings.symbol;
        let mut amount = i128::from(self.chain.balance_of(account, symbol).amount);
        let scheduled = self.effects.iter().filter_map(|e| match e {
            Effect::Transfer(t) => Some(t),
            Effect::Notify { .. } => None,
        });
        for t in self.pending.iter().chain(scheduled) {
            if t.quantity.symbol != symbol {
                continue;
            }
            if &t.from == account {
                amount -= i128::from(t.quantity.amount);
            }
            if &t.to == account {
                amount += i128::from(t.quantity.amount);
            }
        }
        let amount = i64::try_from(amount).unwrap_or(if amount < 0 { i64::MIN } else { i64::MAX });
        Asset {
            amount,
            symbol,
        }
    }

    /// The custody account must keep at least `locked` after this unit.
    pub(crate) fn check_custody_cover(&self) -> LedgerResult<()> {
        let locked = self.config()?.locked;
        let available = self.projected_balance(&self.settings.custody_account);
        if locked.amount > available.amount {
            return Err(LedgerError::Overdraft);
        }
        Ok(())
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    pub(crate) fn notify(&mut self, recipient: &AccountName) {
        self.effects.push(Effect::Notify {
            recipient: recipient.clone(),
        });
    }

    /// Schedules a transfer out of the custody account.
    pub(crate) fn pay_from_custody(&mut self, to: &AccountName, quantity: Asset, memo: &str) {
        let from = self.settings.custody_account.clone();
        self.schedule_transfer(from, to.clone(), quantity, memo);
    }

    pub(crate) fn schedule_transfer(
        &mut self,
        from: AccountName,
        to: AccountName,
        quantity: Asset,
        memo: &str,
    ) {
        self.effects.push(Effect::Transfer(TransferRequest {
            from,
            to,
            quantity,
            memo: memo.to_string(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(name: &str, permission: &str) -> Authority {
        Authority::new(
            AccountName::new(name).unwrap(),
            shared_types::PermissionName::new(permission).unwrap(),
        )
    }

    #[test]
    fn test_context_auth_checks() {
        let ctx = ActionContext::new([auth("alice", "active")].into_iter().collect(), 0);
        assert!(ctx.has_auth(&AccountName::new("alice").unwrap()));
        assert!(!ctx.has_auth(&AccountName::new("bob").unwrap()));
        assert!(ctx.has_authority(&auth("alice", "active")));
        assert!(!ctx.has_authority(&auth("alice", "owner")));
    }
}
