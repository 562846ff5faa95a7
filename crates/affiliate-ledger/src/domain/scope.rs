//! # Capability Scope Graph
//!
//! Each license carries an allow-list of other licenses its holders may
//! broker. Partners can also hold ad-hoc contracts granted on top of the
//! license they joined with.
//!
//! Scope rules, applied on announce and on every license-side grant:
//!
//! - archived licenses cannot be granted
//! - a privileged license can only be granted by a privileged one
//! - public and internal programs never mix

use crate::domain::entities::{License, LicenseTerms};
use crate::domain::ledger::Ledger;
use crate::domain::value_objects::{EntityRef, LicenseId};
use crate::errors::{LedgerError, LedgerResult};
use shared_types::AccountName;

/// Checks `capability` may appear in the allowed scope of a license with
/// terms `grantee`.
pub fn check_scope_entry(grantee: &LicenseTerms, capability: &License) -> LedgerResult<()> {
    if capability.archived {
        return Err(LedgerError::ArchivedCapability);
    }
    if capability.terms.privileged_access && !grantee.privileged_access {
        return Err(LedgerError::PrivilegeEscalation);
    }
    if capability.terms.global_program != grantee.global_program {
        return Err(LedgerError::ProgramTypeMismatch);
    }
    Ok(())
}

impl Ledger<'_> {
    /// Grants `capability` to a license's scope or as a partner contract.
    pub fn empower(
        &mut self,
        entity: &EntityRef,
        capability: LicenseId,
        reason: &str,
    ) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;
        if reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        match entity {
            EntityRef::License(id) => self.extend_scope(*id, capability),
            EntityRef::Partner(account) => self.grant_contract(account, capability),
        }
    }

    /// Removes `capability` from a license's scope or a partner's contracts.
    pub fn revoke(
        &mut self,
        entity: &EntityRef,
        capability: LicenseId,
        reason: &str,
    ) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;
        if reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        match entity {
            EntityRef::License(id) => self.shrink_scope(*id, capability),
            EntityRef::Partner(account) => self.withdraw_contract(account, capability),
        }
    }

    fn check_modifiable(license: &License) -> LedgerResult<()> {
        if license.active {
            return Err(LedgerError::ActiveLicenseModification);
        }
        if license.archived {
            return Err(LedgerError::ArchivedLicenseModification);
        }
        Ok(())
    }

    fn extend_scope(&mut self, id: LicenseId, capability: LicenseId) -> LedgerResult<()> {
        let license = self.license(id, LedgerError::InvalidObject)?;
        let granted = self.license(capability, LedgerError::InvalidCapability)?;

        Self::check_modifiable(license)?;
        if license.allows(capability) {
            return Err(LedgerError::Redundant);
        }
        check_scope_entry(&license.terms, granted)?;

        if let Some(license) = self.state.licenses.get_mut(id) {
            license.terms.allowed_scope.push(capability);
        }
        Ok(())
    }

    fn shrink_scope(&mut self, id: LicenseId, capability: LicenseId) -> LedgerResult<()> {
        let license = self.license(id, LedgerError::InvalidObject)?;
        Self::check_modifiable(license)?;
        let revoked = self.license(capability, LedgerError::InvalidCapability)?;
        if !revoked.terms.revocable {
            return Err(LedgerError::IrrevocableCapability);
        }
        if !license.allows(capability) {
            return Err(LedgerError::Redundant);
        }

        if let Some(license) = self.state.licenses.get_mut(id) {
            license.terms.allowed_scope.retain(|c| *c != capability);
        }
        Ok(())
    }

    fn grant_contract(&mut self, account: &AccountName, capability: LicenseId) -> LedgerResult<()> {
        self.notify(account);
        let partner = self
            .state
            .partners
            .find_by_primary(account)
            .ok_or(LedgerError::InvalidObject)?;
        let granted = self.license(capability, LedgerError::InvalidCapability)?;

        if partner.suspended {
            return Err(LedgerError::SuspendedPartnerModification);
        }
        if partner.holds(capability) {
            return Err(LedgerError::Redundant);
        }
        if !granted.terms.additionable {
            return Err(LedgerError::CapabilityMisappropriation);
        }
        if !granted.active {
            return Err(LedgerError::InactiveCapability);
        }
        if granted.archived {
            return Err(LedgerError::ArchivedCapability);
        }

        let id = partner.id;
        self.state.partners.modify(id, |p| {
            p.contracts.insert(capability, None);
        })?;
        Ok(())
    }

    fn withdraw_contract(
        &mut self,
        account: &AccountName,
        capability: LicenseId,
    ) -> LedgerResult<()> {
        self.notify(account);
        let partner = self
            .state
            .partners
            .find_by_primary(account)
            .ok_or(LedgerError::InvalidObject)?;
        if partner.suspended {
            return Err(LedgerError::SuspendedPartnerModification);
        }
        let revoked = self.license(capability, LedgerError::InvalidCapability)?;
        if !revoked.terms.revocable {
            return Err(LedgerError::IrrevocableCapability);
        }
        if !partner.holds(capability) {
            return Err(LedgerError::Redundant);
        }

        let id = partner.id;
        self.state.partners.modify(id, |p| {
            p.contracts.remove(&capability);
        })?;
        Ok(())
    }
}
