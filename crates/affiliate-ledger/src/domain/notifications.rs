//! # Transfer Notifications
//!
//! Reaction to token transfers touching the ledger or the custody account.
//!
//! | Direction | Effect |
//! |-----------|--------|
//! | into ledger account | amount and memo checks only |
//! | into custody | credit the sender's application or partner, lock the amount |
//! | out of ledger account | recipient must exist |
//! | out of custody | custody must still cover `locked` |
//! | anything else | ignored |

use crate::domain::effects::Outcome;
use crate::domain::ledger::Ledger;
use crate::errors::{LedgerError, LedgerResult};
use shared_types::{TransferNotice, TransferRequest, MAX_ASSET_AMOUNT};

impl Ledger<'_> {
    /// Handles a transfer notification and closes the unit.
    pub fn on_transfer(mut self, notice: &TransferNotice) -> LedgerResult<Outcome> {
        let settings = self.settings;
        let ledger = &settings.ledger_account;
        let custody = &settings.custody_account;

        if &notice.to == ledger {
            self.check_asset("quantity", notice.quantity, 1, MAX_ASSET_AMOUNT)?;
            if !notice.memo.is_empty() && !settings.is_whitelisted(&notice.from) {
                return Err(LedgerError::SpamMemo);
            }
        } else if &notice.to == custody {
            self.config()?;
            self.check_asset("quantity", notice.quantity, 1, MAX_ASSET_AMOUNT)?;
            let credited = self.credit_application(&notice.from, notice.quantity)?
                || self.credit_partner_account(&notice.from, notice.quantity)?;
            if !credited {
                return Err(LedgerError::NoViableTarget);
            }
            self.adjust_locked(notice.quantity)?;
        } else if &notice.from == ledger {
            self.require_account(&notice.to)?;
        } else if &notice.from == custody {
            self.config()?;
            self.check_asset("quantity", notice.quantity, 1, MAX_ASSET_AMOUNT)?;
            self.check_custody_cover()?;
        }

        self.finish()
    }

    /// Runs a user-submitted transfer through the notification path. The
    /// sender must have signed; the transfer itself counts as settling in this
    /// unit for every balance check.
    pub fn relay_transfer(self, request: TransferRequest) -> LedgerResult<Outcome> {
        self.require_auth(&request.from)?;
        let notice = TransferNotice {
            from: request.from.clone(),
            to: request.to.clone(),
            quantity: request.quantity,
            memo: request.memo.clone(),
        };
        self.with_pending(vec![request]).on_transfer(&notice)
    }
}
