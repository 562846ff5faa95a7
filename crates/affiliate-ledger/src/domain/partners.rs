//! # Partner Ledger
//!
//! Balance bookkeeping and account control for onboarded partners.
//!
//! Every balance change goes through [`reserve_delta`] so `locked` follows the
//! positive part of the balance. Debt carried over from joining is never
//! reserved.

use crate::domain::custody::reserve_delta;
use crate::domain::entities::{deadline, SyncEntry};
use crate::domain::ledger::Ledger;
use crate::domain::value_objects::{LicenseId, PartnerId, Rate, RateLimit};
use crate::errors::{LedgerError, LedgerResult};
use shared_types::{AccountName, Asset, MAX_ASSET_AMOUNT};

const PROFIT_MEMO: &str = "Affiliate program profit";
const TERMINATION_MEMO: &str = "Affiliate program participation termination";

impl Ledger<'_> {
    /// Adds `delta` to a partner's balance and moves `locked` accordingly.
    fn credit_partner(&mut self, id: PartnerId, delta: Asset) -> LedgerResult<()> {
        let prior = self
            .state
            .partners
            .get(id)
            .map(|p| p.balance)
            .ok_or(LedgerError::PartnerMissing)?;
        let balance = prior.checked_add(delta)?;
        self.state.partners.modify(id, |p| p.balance = balance)?;
        self.adjust_locked(reserve_delta(prior, delta)?)
    }

    /// Credits an inbound payment to the partner whose primary is `account`.
    pub(crate) fn credit_partner_account(
        &mut self,
        account: &AccountName,
        quantity: Asset,
    ) -> LedgerResult<bool> {
        let Some(id) = self.state.partners.find_by_primary(account).map(|p| p.id) else {
            return Ok(false);
        };
        let prior = self
            .state
            .partners
            .get(id)
            .map(|p| p.balance)
            .ok_or(LedgerError::PartnerMissing)?;
        let balance = prior.checked_add(quantity)?;
        self.state.partners.modify(id, |p| p.balance = balance)?;
        Ok(true)
    }

    /// Renegotiates the rate of a held license and/or moves the balance.
    /// Requires the witness co-signature.
    #[allow(clippy::float_cmp)]
    pub fn update(
        &mut self,
        account: &AccountName,
        license: LicenseId,
        rate: Option<Rate>,
        balance: Option<Asset>,
    ) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_witness()?;
        self.require_account(account)?;

        let partner = self.partner_by_account(account)?.clone();
        let limit = self.license(license, LedgerError::InvalidLicense)?.rate.limit;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        let Some(current) = partner.contracts.get(&license).copied() else {
            return Err(LedgerError::LicenseSpoofing);
        };
        if rate.is_none() && balance.is_none() {
            return Err(LedgerError::Redundant);
        }

        if let Some(rate) = rate {
            if current == Some(rate) {
                return Err(LedgerError::Redundant);
            }
            match limit {
                RateLimit::Range { from, to } => {
                    if rate < from || rate > to {
                        return Err(LedgerError::RateOutOfRange { from, to });
                    }
                }
                RateLimit::Fixed { .. } | RateLimit::PeerToPeer { .. } => {
                    return Err(LedgerError::RateNotUpdatable);
                }
            }
            self.state.partners.modify(partner.id, |p| {
                p.contracts.insert(license, Some(rate));
            })?;
        }

        if let Some(delta) = balance {
            self.check_asset("balance", delta, -MAX_ASSET_AMOUNT, MAX_ASSET_AMOUNT)?;
            if delta.is_zero() {
                return Err(LedgerError::Redundant);
            }
            self.credit_partner(partner.id, delta)?;
        }
        Ok(())
    }

    /// Swaps a held license for a more expensive one, paying the difference
    /// out of the balance. Requires the witness co-signature.
    pub fn upgrade(
        &mut self,
        account: &AccountName,
        from: LicenseId,
        to: LicenseId,
        rate: Option<Rate>,
    ) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_witness()?;
        self.require_account(account)?;

        let partner = self.partner_by_account(account)?.clone();
        let current = self.license(from, LedgerError::InvalidCurrentLicense)?.clone();
        let target = self.license(to, LedgerError::InvalidTargetLicense)?.clone();

        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        if !partner.holds(from) {
            return Err(LedgerError::CurrentLicenseSpoofing);
        }
        if partner.holds(to) {
            return Err(LedgerError::Redundant);
        }
        if !current.terms.upgradable {
            return Err(LedgerError::NonUpgradableLicense);
        }
        if !target.active {
            return Err(LedgerError::InactiveTargetLicense);
        }
        if target.archived {
            return Err(LedgerError::ArchivedTargetLicense);
        }
        if !target.terms.is_public() {
            return Err(LedgerError::PrivilegedTargetLicense);
        }
        if current.terms.franchise != target.terms.franchise {
            return Err(LedgerError::FranchiseMismatch);
        }
        if !current.rate.limit.same_kind(&target.rate.limit) {
            return Err(LedgerError::InconsistentRateLimits);
        }
        target.rate.limit.check_contract_rate(rate)?;

        let fee = target.fee.checked_sub(current.fee)?;
        if fee.is_negative() {
            return Err(LedgerError::LicenseDowngrade);
        }
        if fee.amount > partner.balance.amount {
            return Err(LedgerError::UpgradeFeeNotCovered);
        }

        self.state.partners.modify(partner.id, |p| {
            p.contracts.remove(&from);
            p.contracts.insert(to, rate);
        })?;
        self.credit_partner(partner.id, fee.negated())
    }

    /// Names a standby account for succession.
    pub fn insure(&mut self, account: &AccountName, standby: AccountName) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_account(account)?;
        self.require_account(&standby)?;
        self.notify(&standby);

        let partner = self.partner_by_account(account)?;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        let id = partner.id;
        self.check_unused_account(&standby)?;

        self.state.partners.modify(id, |p| p.standby = Some(standby))?;
        Ok(())
    }

    /// Standby takes over: primary and standby swap places.
    pub fn failover(&mut self, account: &AccountName) -> LedgerResult<()> {
        self.config()?;
        self.notify(account);

        let partner = self.partner_by_account(account)?;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        let id = partner.id;
        let standby = partner.standby.clone().ok_or(LedgerError::StandbyNotSet)?;
        self.require_auth(&standby)?;
        self.require_account(&standby)?;

        let primary = account.clone();
        self.state.partners.modify(id, |p| {
            p.primary = standby;
            p.standby = Some(primary);
        })?;
        Ok(())
    }

    /// Hands the partnership to `successor`, dropping the standby.
    ///
    /// The partner may delegate at any time; the administrator only once the
    /// partner has expired.
    pub fn delegate(&mut self, account: &AccountName, successor: AccountName) -> LedgerResult<()> {
        self.config()?;
        self.require_account(account)?;
        self.require_account(&successor)?;
        self.notify(account);
        self.notify(&successor);

        let partner = self.partner_by_account(account)?;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        let (id, eol) = (partner.id, partner.eol);
        self.require_owner_or_expired_admin(account, eol, LedgerError::PartnerNotExpired)?;
        self.check_unused_account(&successor)?;

        self.state.partners.modify(id, |p| {
            p.primary = successor;
            p.standby = None;
        })?;
        Ok(())
    }

    /// Leaves the program: contracts dropped, balance paid out, partner frozen.
    pub fn quit(&mut self, account: &AccountName) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_account(account)?;

        let partner = self.partner_by_account(account)?;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        let (id, balance) = (partner.id, partner.balance);

        let zero = self.zero();
        self.state.partners.modify(id, |p| {
            p.contracts.clear();
            p.balance = zero;
            p.suspended = true;
        })?;

        if balance.is_positive() {
            self.pay_from_custody(account, balance, TERMINATION_MEMO);
            self.release_locked(balance)?;
        }
        Ok(())
    }

    /// Pushes the partner's expiry `ttl.safeguard` seconds into the future.
    pub fn prolong(&mut self, account: &AccountName) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_account(account)?;

        let id = self.partner_by_account(account)?.id;
        let eol = deadline(self.ctx.now, self.config()?.ttl.safeguard);
        self.state.partners.modify(id, |p| p.eol = eol)?;
        Ok(())
    }

    /// Pays `quantity` of the partner's balance out to `payee`.
    pub fn withdraw(
        &mut self,
        account: &AccountName,
        payee: AccountName,
        quantity: Asset,
    ) -> LedgerResult<()> {
        self.config()?;
        self.require_auth(account)?;
        self.require_account(account)?;

        let partner = self.partner_by_account(account)?;
        let (id, balance) = (partner.id, partner.balance);
        if !self.chain.account_exists(&payee) {
            return Err(LedgerError::PayeeMissing);
        }
        self.check_asset("quantity", quantity, 1, balance.amount)?;

        self.credit_partner(id, quantity.negated())?;
        self.pay_from_custody(&payee, quantity, PROFIT_MEMO);
        Ok(())
    }

    /// Freezes or unfreezes a partner, or one broker deal of it.
    ///
    /// With `deal`, the flag is set on the broker record of partner `deal`,
    /// which must have been brokered by `account`.
    pub fn set_suspended(
        &mut self,
        account: &AccountName,
        deal: Option<PartnerId>,
        reason: &str,
        suspended: bool,
    ) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;
        self.notify(account);
        if reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        let partner = self.partner_by_account(account)?;
        let broker_id = partner.id;

        match deal {
            Some(deal_id) => {
                let deal = self
                    .state
                    .partners
                    .get(deal_id)
                    .ok_or(LedgerError::DealMissing)?;
                let broker = deal.broker.as_ref().ok_or(LedgerError::InvalidDeal)?;
                if broker.partner != broker_id {
                    return Err(LedgerError::InconsistentDeal);
                }
                if broker.suspended == suspended {
                    return Err(LedgerError::Redundant);
                }
                self.state.partners.modify(deal_id, |p| {
                    if let Some(broker) = p.broker.as_mut() {
                        broker.suspended = suspended;
                    }
                })?;
            }
            None => {
                if partner.suspended == suspended {
                    return Err(LedgerError::Redundant);
                }
                self.state
                    .partners
                    .modify(broker_id, |p| p.suspended = suspended)?;
            }
        }
        Ok(())
    }

    /// Applies a batch of administrative balance corrections. All or nothing.
    pub fn sync(&mut self, entries: &[SyncEntry]) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;

        for entry in entries {
            self.sync_entry(entry)
                .map_err(|e| e.for_sync_entry(&entry.owner))?;
        }

        let now = self.ctx.now;
        self.state.config_mut()?.last_sync = now;
        Ok(())
    }

    fn sync_entry(&mut self, entry: &SyncEntry) -> LedgerResult<()> {
        self.notify(&entry.owner);
        let partner = self.partner_by_account(&entry.owner)?;
        let (id, suspended, holds) = (partner.id, partner.suspended, partner.holds(entry.license));
        self.license(entry.license, LedgerError::InvalidLicense)?;
        if suspended {
            return Err(LedgerError::SuspendedPartner);
        }
        if !holds {
            return Err(LedgerError::LicenseSpoofing);
        }
        self.check_asset("saldo", entry.saldo, -MAX_ASSET_AMOUNT, MAX_ASSET_AMOUNT)?;
        if entry.saldo.is_zero() {
            return Err(LedgerError::Redundant);
        }
        self.credit_partner(id, entry.saldo)
    }
}
