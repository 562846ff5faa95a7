//! # In-Memory Chain
//!
//! Accounts, contract flags and token balances held in memory. Serves as both
//! the [`ChainHost`] view and the [`TransferExecutor`] for tests and scripted
//! runs.

use crate::errors::TreasuryError;
use crate::ports::outbound::{ChainHost, TransferExecutor};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{AccountName, Asset, Symbol, TransferRequest};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
struct Book {
    accounts: HashSet<AccountName>,
    contracts: HashSet<AccountName>,
    balances: HashMap<(AccountName, Symbol), i64>,
}

impl Book {
    fn balance(&self, account: &AccountName, symbol: Symbol) -> i64 {
        self.balances
            .get(&(account.clone(), symbol))
            .copied()
            .unwrap_or(0)
    }

    fn apply(&mut self, transfer: &TransferRequest) -> Result<(), TreasuryError> {
        let quantity = transfer.quantity;
        if !quantity.is_valid() || !quantity.is_positive() {
            return Err(TreasuryError::InvalidQuantity(quantity));
        }
        if !self.accounts.contains(&transfer.to) {
            return Err(TreasuryError::UnknownRecipient(transfer.to.clone()));
        }
        let available = self.balance(&transfer.from, quantity.symbol);
        if available < quantity.amount {
            return Err(TreasuryError::InsufficientFunds {
                account: transfer.from.clone(),
                required: quantity,
                available: Asset {
                    amount: available,
                    symbol: quantity.symbol,
                },
            });
        }
        *self
            .balances
            .entry((transfer.from.clone(), quantity.symbol))
            .or_insert(0) -= quantity.amount;
        *self
            .balances
            .entry((transfer.to.clone(), quantity.symbol))
            .or_insert(0) += quantity.amount;
        Ok(())
    }
}

/// In-memory chain for testing.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    book: RwLock<Book>,
}

impl InMemoryChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain where every account in `names` exists.
    #[must_use]
    pub fn with_accounts<'a>(names: impl IntoIterator<Item = &'a AccountName>) -> Self {
        let chain = Self::new();
        for name in names {
            chain.create_account(name.clone());
        }
        chain
    }

    pub fn create_account(&self, account: AccountName) {
        self.book.write().accounts.insert(account);
    }

    /// Flags `account` as having code deployed.
    pub fn mark_contract(&self, account: AccountName) {
        let mut book = self.book.write();
        book.accounts.insert(account.clone());
        book.contracts.insert(account);
    }

    /// Overwrites the balance of `asset.symbol` held by `account`.
    pub fn set_balance(&self, account: &AccountName, asset: Asset) {
        let mut book = self.book.write();
        book.accounts.insert(account.clone());
        book.balances
            .insert((account.clone(), asset.symbol), asset.amount);
    }

    /// Mints `asset` into `account`.
    pub fn issue(&self, account: &AccountName, asset: Asset) {
        let mut book = self.book.write();
        book.accounts.insert(account.clone());
        *book
            .balances
            .entry((account.clone(), asset.symbol))
            .or_insert(0) += asset.amount;
    }
}

impl ChainHost for InMemoryChain {
    fn account_exists(&self, account: &AccountName) -> bool {
        self.book.read().accounts.contains(account)
    }

    fn is_contract(&self, account: &AccountName) -> bool {
        self.book.read().contracts.contains(account)
    }

    fn balance_of(&self, account: &AccountName, symbol: Symbol) -> Asset {
        Asset {
            amount: self.book.read().balance(account, symbol),
            symbol,
        }
    }
}

#[async_trait]
impl TransferExecutor for InMemoryChain {
    async fn execute_batch(&self, transfers: &[TransferRequest]) -> Result<(), TreasuryError> {
        let mut book = self.book.write();
        // Apply on a scratch copy so a failing transfer leaves no trace.
        let mut scratch = book.clone();
        for transfer in transfers {
            scratch.apply(transfer)?;
        }
        *book = scratch;
        Ok(())
    }
}
