//! # Application Queue
//!
//! Deposit-gated onboarding.
//!
//! An application snapshots the license fee and the granted discount. Deposits
//! accumulate on it until `claim` promotes it to a partner, or `refuse` drops
//! it and refunds whatever was collected. Applications expire
//! `ttl.application` seconds after creation; expiry only matters when the
//! administrator refuses on the owner's behalf.

use crate::domain::effects::Created;
use crate::domain::entities::{deadline, Application, BrokerRequest, License, Partner};
use crate::domain::ledger::Ledger;
use crate::domain::value_objects::{ApplicationId, LicenseId, PartnerId, Rate};
use crate::errors::{LedgerError, LedgerResult};
use shared_types::{AccountName, Asset};
use std::collections::BTreeMap;

const REFUND_MEMO: &str = "Affiliate license deposit refund";
const REWARD_MEMO: &str = "Affiliate program broker reward";

impl Ledger<'_> {
    /// Live license usable for onboarding.
    fn live_license(&self, id: LicenseId) -> LedgerResult<License> {
        let license = self.license(id, LedgerError::InvalidLicense)?;
        if !license.active {
            return Err(LedgerError::InactiveLicense);
        }
        if license.archived {
            return Err(LedgerError::ArchivedLicense);
        }
        Ok(license.clone())
    }

    /// Negotiated rate and discount must fit the license.
    fn check_onboarding_terms(
        &self,
        license: &License,
        rate: Option<Rate>,
        discount: Asset,
    ) -> LedgerResult<()> {
        license.rate.limit.check_contract_rate(rate)?;
        self.check_asset("discount", discount, 0, license.fee.amount)
    }

    /// Partner self-service signup. Requires the witness co-signature.
    pub fn apply(
        &mut self,
        account: AccountName,
        license: LicenseId,
        rate: Option<Rate>,
        discount: Asset,
        broker: &BrokerRequest,
    ) -> LedgerResult<ApplicationId> {
        self.config()?;
        self.require_auth(&account)?;
        self.require_witness()?;
        self.require_account(&account)?;
        self.check_unused_account(&account)?;

        let target = self.live_license(license)?;
        if !target.terms.is_public() {
            return Err(LedgerError::PrivilegedLicense);
        }
        self.check_onboarding_terms(&target, rate, discount)?;
        let broker = self.resolve_broker(broker, target.id)?;

        let id = self.state.applications.next_id();
        let eol = deadline(self.ctx.now, self.config()?.ttl.application);
        self.state.applications.insert(Application {
            id,
            owner: account,
            affiliate: None,
            license: target.id,
            rate,
            fee: target.fee,
            discount,
            deposit: self.zero(),
            broker: Some(broker),
            eol,
        })?;
        Ok(id)
    }

    /// Administrator signup, optionally approved straight into a partner.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &mut self,
        partner: AccountName,
        affiliate: Option<AccountName>,
        license: LicenseId,
        rate: Option<Rate>,
        discount: Asset,
        broker: Option<&BrokerRequest>,
        approved: bool,
    ) -> LedgerResult<Created> {
        self.require_admin()?;
        self.config()?;
        self.require_account(&partner)?;
        self.notify(&partner);
        self.check_unused_account(&partner)?;
        if let Some(affiliate) = &affiliate {
            self.check_unused_affiliate(affiliate)?;
        }

        let target = self.live_license(license)?;
        if !target.terms.global_program {
            return Err(LedgerError::InternalLicense);
        }
        if target.terms.franchise != affiliate.is_some() {
            return Err(LedgerError::FranchiseMismatch);
        }
        self.check_onboarding_terms(&target, rate, discount)?;
        let broker = broker
            .map(|request| self.resolve_broker(request, target.id))
            .transpose()?;

        let ttl = self.config()?.ttl;
        if approved {
            let id = self.state.partners.next_id();
            let balance = discount.checked_sub(target.fee)?;
            self.state.partners.insert(Partner {
                id,
                primary: partner,
                standby: None,
                affiliate,
                contracts: BTreeMap::from([(target.id, rate)]),
                balance,
                broker,
                suspended: false,
                eol: deadline(self.ctx.now, ttl.safeguard),
            })?;
            Ok(Created::Partner(id))
        } else {
            let id = self.state.applications.next_id();
            self.state.applications.insert(Application {
                id,
                owner: partner,
                affiliate,
                license: target.id,
                rate,
                fee: target.fee,
                discount,
                deposit: self.zero(),
                broker,
                eol: deadline(self.ctx.now, ttl.application),
            })?;
            Ok(Created::Application(id))
        }
    }

    /// Promotes a fully funded application to a partner.
    pub fn claim(&mut self, owner: &AccountName) -> LedgerResult<PartnerId> {
        self.config()?;
        self.require_auth(owner)?;
        self.require_account(owner)?;

        let application = self
            .state
            .applications
            .find_by_owner(owner)
            .cloned()
            .ok_or(LedgerError::ApplicationMissing)?;
        let payable = application.payable_fee()?;
        if payable.amount > application.deposit.amount {
            return Err(LedgerError::DepositNotEnough);
        }

        self.state.applications.remove(application.id);

        let id = self.state.partners.next_id();
        let balance = application.deposit.checked_sub(payable)?;
        let safeguard = self.config()?.ttl.safeguard;
        self.state.partners.insert(Partner {
            id,
            primary: application.owner.clone(),
            standby: None,
            affiliate: application.affiliate.clone(),
            contracts: BTreeMap::from([(application.license, application.rate)]),
            balance,
            broker: application.broker.clone(),
            suspended: false,
            eol: deadline(self.ctx.now, safeguard),
        })?;

        if let Some(deal) = application.broker.as_ref().filter(|b| !b.suspended) {
            let broker = self
                .state
                .partners
                .get(deal.partner)
                .ok_or(LedgerError::BrokerMissing)?;
            let license = self.license(deal.license, LedgerError::InvalidBrokerLicense)?;
            if broker.holds(deal.license) && !broker.suspended && license.terms.instant_payout {
                let reward = payable.mul_rate(deal.rate);
                let recipient = broker.primary.clone();
                if reward.is_positive() {
                    self.pay_from_custody(&recipient, reward, REWARD_MEMO);
                }
            }
        }

        self.release_locked(payable)?;
        Ok(id)
    }

    /// Drops an application and refunds its deposit.
    pub fn refuse(&mut self, id: ApplicationId) -> LedgerResult<()> {
        self.config()?;
        let application = self
            .state
            .applications
            .get(id)
            .cloned()
            .ok_or(LedgerError::ApplicationMissing)?;
        self.require_owner_or_expired_admin(
            &application.owner,
            application.eol,
            LedgerError::ApplicationNotExpired,
        )?;
        if !self.ctx.has_auth(&application.owner) {
            self.notify(&application.owner);
        }

        self.state.applications.remove(id);

        if application.deposit.is_positive() {
            self.pay_from_custody(&application.owner, application.deposit, REFUND_MEMO);
            self.release_locked(application.deposit)?;
        }
        Ok(())
    }

    /// Credits an inbound deposit to the sender's application, if any.
    pub(crate) fn credit_application(
        &mut self,
        owner: &AccountName,
        quantity: Asset,
    ) -> LedgerResult<bool> {
        let Some(id) = self.state.applications.find_by_owner(owner).map(|a| a.id) else {
            return Ok(false);
        };
        let deposit = self
            .state
            .applications
            .get(id)
            .map(|a| a.deposit)
            .ok_or(LedgerError::ApplicationMissing)?
            .checked_add(quantity)?;
        self.state.applications.modify(id, |a| a.deposit = deposit)?;
        Ok(true)
    }
}
