//! # Ledger Configuration
//!
//! Accounts and the unit of account the ledger works with.
//!
//! Loaded from environment variables with sane defaults. Unlike
//! `GlobalConfig`, these settings are not part of the persisted state: they
//! describe the deployment the ledger runs in.

use serde::{Deserialize, Serialize};
use shared_types::{AccountName, Symbol};
use std::env;
use thiserror::Error;

/// Deployment settings of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Account the ledger acts as. Its `active` authority is the administrator.
    pub ledger_account: AccountName,
    /// Treasury account holding partner funds and deposits.
    pub custody_account: AccountName,
    /// Cold account receiving the evacuation sweep.
    pub custodian_account: AccountName,
    /// Token contract executing transfers.
    pub token_contract: AccountName,
    /// Unit of account.
    pub symbol: Symbol,
    /// Senders allowed to attach a memo to transfers into the ledger account.
    pub whitelisted_senders: Vec<AccountName>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let custody = AccountName::from_static("custody.bank");
        let custodian = AccountName::from_static("airgap.bank");
        let token = AccountName::from_static("eosio.token");
        Self {
            ledger_account: AccountName::from_static("affiliate"),
            whitelisted_senders: vec![
                custody.clone(),
                custodian.clone(),
                token.clone(),
                AccountName::from_static("eosio"),
            ],
            custody_account: custody,
            custodian_account: custodian,
            token_contract: token,
            symbol: Symbol::EOS,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an invalid value.
    #[error("{var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    /// Two roles point at the same account.
    #[error("{first} and {second} accounts must differ")]
    SharedAccount {
        first: &'static str,
        second: &'static str,
    },
}

fn account_var(var: &'static str, default: AccountName) -> Result<AccountName, ConfigError> {
    match env::var(var) {
        Ok(value) => AccountName::new(value).map_err(|e| ConfigError::InvalidVar {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl LedgerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AL_LEDGER_ACCOUNT` (default: affiliate)
    /// - `AL_CUSTODY_ACCOUNT` (default: custody.bank)
    /// - `AL_CUSTODIAN_ACCOUNT` (default: airgap.bank)
    /// - `AL_TOKEN_CONTRACT` (default: eosio.token)
    /// - `AL_SYMBOL` as `precision,CODE` (default: 4,EOS)
    /// - `AL_WHITELIST`: comma separated accounts, replaces the default list
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let symbol = match env::var("AL_SYMBOL") {
            Ok(value) => value.parse().map_err(|e: shared_types::AssetError| {
                ConfigError::InvalidVar {
                    var: "AL_SYMBOL",
                    reason: e.to_string(),
                }
            })?,
            Err(_) => defaults.symbol,
        };

        let whitelisted_senders = match env::var("AL_WHITELIST") {
            Ok(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    AccountName::new(s).map_err(|e| ConfigError::InvalidVar {
                        var: "AL_WHITELIST",
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.whitelisted_senders,
        };

        let config = Self {
            ledger_account: account_var("AL_LEDGER_ACCOUNT", defaults.ledger_account)?,
            custody_account: account_var("AL_CUSTODY_ACCOUNT", defaults.custody_account)?,
            custodian_account: account_var("AL_CUSTODIAN_ACCOUNT", defaults.custodian_account)?,
            token_contract: account_var("AL_TOKEN_CONTRACT", defaults.token_contract)?,
            symbol,
            whitelisted_senders,
        };
        config.validate()?;
        Ok(config)
    }

    /// The ledger, custody and custodian roles must be distinct accounts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger_account == self.custody_account {
            return Err(ConfigError::SharedAccount {
                first: "ledger",
                second: "custody",
            });
        }
        if self.ledger_account == self.custodian_account {
            return Err(ConfigError::SharedAccount {
                first: "ledger",
                second: "custodian",
            });
        }
        if self.custody_account == self.custodian_account {
            return Err(ConfigError::SharedAccount {
                first: "custody",
                second: "custodian",
            });
        }
        Ok(())
    }

    /// True if `account` may attach a memo to transfers into the ledger account.
    #[must_use]
    pub fn is_whitelisted(&self, account: &AccountName) -> bool {
        self.whitelisted_senders.contains(account)
    }
}
