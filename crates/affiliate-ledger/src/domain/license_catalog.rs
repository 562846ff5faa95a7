//! # License Catalog
//!
//! Announcing, activating and archiving licenses.
//!
//! Lifecycle: `announce` creates an inactive license, `activate` launches it,
//! `archive` retires it for good. The rate shape chosen at announce time
//! never changes.

use crate::domain::entities::{License, LicenseTerms};
use crate::domain::ledger::Ledger;
use crate::domain::scope::check_scope_entry;
use crate::domain::value_objects::{LicenseId, LicenseRate};
use crate::errors::{LedgerError, LedgerResult};
use shared_types::Asset;

/// Suffix appended to the name of archived licenses.
pub const ARCHIVED_SUFFIX: &str = " (archived)";

impl Ledger<'_> {
    /// Creates an inactive license.
    pub fn announce(
        &mut self,
        name: String,
        fee: Asset,
        rate: LicenseRate,
        terms: LicenseTerms,
    ) -> LedgerResult<LicenseId> {
        self.require_admin()?;
        self.config()?;

        if name.trim().is_empty() {
            return Err(LedgerError::EmptyLicenseName);
        }
        self.check_non_negative("fee", fee)?;
        rate.limit.validate(terms.additionable)?;

        if terms.platform_commission >= 100 {
            return Err(LedgerError::CommissionTooHigh);
        }
        for capability in &terms.allowed_scope {
            let capability = self.license(*capability, LedgerError::InvalidLicenseScope)?;
            check_scope_entry(&terms, capability)?;
        }
        if terms.referral_ttl_secs < 0 {
            return Err(LedgerError::NegativeReferralTtl);
        }
        if terms.franchise {
            if terms.additionable {
                return Err(LedgerError::FranchiseTermsViolated("additionable"));
            }
            if terms.upgradable {
                return Err(LedgerError::FranchiseTermsViolated("upgradable"));
            }
            if terms.revocable {
                return Err(LedgerError::FranchiseTermsViolated("revocable"));
            }
        }

        let id = self.state.licenses.next_id();
        self.state.licenses.insert(License {
            id,
            name,
            fee,
            rate,
            terms,
            active: false,
            archived: false,
        })?;
        Ok(id)
    }

    /// One-way transition to active.
    pub fn activate(&mut self, id: LicenseId) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;

        let license = self.license(id, LedgerError::InvalidLicense)?;
        if license.active {
            return Err(LedgerError::Redundant);
        }
        if license.archived {
            return Err(LedgerError::ArchivedLicense);
        }

        if let Some(license) = self.state.licenses.get_mut(id) {
            license.active = true;
        }
        Ok(())
    }

    /// Retires an active license. Irreversible.
    pub fn archive(&mut self, id: LicenseId, reason: &str) -> LedgerResult<()> {
        self.require_admin()?;
        self.config()?;

        let license = self.license(id, LedgerError::InvalidLicense)?;
        if !license.active {
            return Err(LedgerError::InactiveLicense);
        }
        if license.archived {
            return Err(LedgerError::Redundant);
        }
        if reason.trim().is_empty() {
            return Err(LedgerError::ReasonRequired);
        }

        if let Some(license) = self.state.licenses.get_mut(id) {
            license.name.push_str(ARCHIVED_SUFFIX);
            license.active = false;
            license.archived = true;
        }
        Ok(())
    }
}
