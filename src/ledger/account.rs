use dashmap::DashMap;
use log::info;

use std::collections::HashMap;
use std::sync::Arc;

use super::storage::{Storage, StorageError};

/// Mapping of account identifier to balance.
///
/// Balances never go negative: debits fail without mutation when the funds
/// are not there, credits always succeed. Every successful mutation is
/// persisted to the storage collaborator before the in-memory state is
/// updated, and no account is ever removed.
pub struct AccountLedger {
    balances: DashMap<String, f64>,
    store: Arc<dyn Storage>,
}

impl std::fmt::Debug for AccountLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLedger")
            .field("accounts", &self.balances.len())
            .finish()
    }
}

impl AccountLedger {
    /// Loads the ledger from storage.
    pub fn load(store: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let balances = DashMap::new();
        for (account, amount) in store.load_balances()? {
            balances.insert(account, amount);
        }

        Ok(AccountLedger { balances, store })
    }

    /// Gets the balance of an account; unknown accounts hold 0.
    pub fn balance(&self, account: &str) -> f64 {
        self.balances.get(account).map(|b| *b).unwrap_or(0.0)
    }

    /// Unconditionally increases an account's balance.
    pub fn credit(&self, account: &str, amount: f64) -> Result<(), StorageError> {
        let new_balance = self.balance(account) + amount;
        self.store.save_balance(account, new_balance)?;
        self.balances.insert(account.to_string(), new_balance);
        Ok(())
    }

    /// Decreases an account's balance.
    ///
    /// Returns `Ok(false)` without any mutation when the current balance is
    /// below the requested amount.
    pub fn debit(&self, account: &str, amount: f64) -> Result<bool, StorageError> {
        let current = self.balance(account);
        if current < amount {
            return Ok(false);
        }

        let new_balance = current - amount;
        self.store.save_balance(account, new_balance)?;
        self.balances.insert(account.to_string(), new_balance);
        Ok(true)
    }

    /// Snapshot of all balances.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.balances
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Credits `amount` to each listed account that does not exist yet.
    ///
    /// Used to set up the demo identities on first start; accounts already
    /// present keep their balance.
    pub fn seed_missing(&self, accounts: &[&str], amount: f64) -> Result<(), StorageError> {
        for account in accounts {
            if !self.balances.contains_key(*account) {
                self.credit(account, amount)?;
                info!("Initialized account {} with balance {}", account, amount);
            }
        }
        Ok(())
    }
}
