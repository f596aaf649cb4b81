//! In-memory ledger store.
//!
//! Units of work are serialized: `begin` takes an exclusive lock on the whole
//! ledger and works on a copy, which `commit` swaps in. Dropping the unit
//! releases the lock and throws the copy away.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tally_shared::types::{AccountId, CategoryId, GroupId, TransactionId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::StoreError;
use super::store::{LedgerStore, UnitOfWork};
use super::types::{Account, Category, LinkCode, Transaction};
use crate::currency::ExchangeRate;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    members: HashMap<GroupId, HashSet<UserId>>,
    accounts: HashMap<AccountId, Account>,
    categories: HashMap<CategoryId, Category>,
    entries: BTreeMap<TransactionId, Transaction>,
    rates: Vec<ExchangeRate>,
}

/// Ledger store kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user_id` to `group_id`.
    pub async fn add_member(&self, group_id: GroupId, user_id: UserId) {
        self.state
            .lock()
            .await
            .members
            .entry(group_id)
            .or_default()
            .insert(user_id);
    }

    /// Inserts or replaces an account.
    pub async fn put_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    /// Inserts or replaces a category.
    pub async fn put_category(&self, category: Category) {
        self.state.lock().await.categories.insert(category.id, category);
    }

    /// Appends an exchange rate row.
    pub async fn put_rate(&self, rate: ExchangeRate) {
        self.state.lock().await.rates.push(rate);
    }

    /// Returns a committed account.
    pub async fn account(&self, id: AccountId) -> Option<Account> {
        self.state.lock().await.accounts.get(&id).cloned()
    }

    /// Returns a committed entry.
    pub async fn entry(&self, id: TransactionId) -> Option<Transaction> {
        self.state.lock().await.entries.get(&id).cloned()
    }

    /// Returns every committed account.
    pub async fn accounts(&self) -> Vec<Account> {
        self.state.lock().await.accounts.values().cloned().collect()
    }

    /// Returns every committed entry, ordered by ID.
    pub async fn entries(&self) -> Vec<Transaction> {
        self.state.lock().await.entries.values().cloned().collect()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Unit = InMemoryUnit;

    async fn begin(&self) -> Result<Self::Unit, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryUnit { guard, working })
    }
}

/// Unit of work over [`InMemoryLedgerStore`].
pub struct InMemoryUnit {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

impl std::fmt::Debug for InMemoryUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUnit")
            .field("entries", &self.working.entries.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn find_entry(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.working.entries.get(&id).cloned())
    }

    async fn find_entry_for_update(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        // The whole ledger is already held exclusively.
        self.find_entry(id).await
    }

    async fn find_entries_by_link(
        &mut self,
        code: &LinkCode,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .filter(|e| e.link_code.as_ref() == Some(code))
            .cloned()
            .collect())
    }

    async fn list_account_entries(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .working
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn list_exchange_rates(&mut self) -> Result<Vec<ExchangeRate>, StoreError> {
        Ok(self.working.rates.clone())
    }

    async fn is_group_member(
        &mut self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .working
            .members
            .get(&group_id)
            .is_some_and(|users| users.contains(&user_id)))
    }

    async fn insert_entry(&mut self, entry: &Transaction) -> Result<(), StoreError> {
        if self.working.entries.contains_key(&entry.id) {
            return Err(StoreError::Backend(format!("duplicate transaction id {}", entry.id)));
        }
        self.working.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update_entry(&mut self, entry: &Transaction) -> Result<(), StoreError> {
        match self.working.entries.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(StoreError::Backend(format!("transaction {} does not exist", entry.id))),
        }
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
