//! Storage seams for the ledger engine.
//!
//! The engine never talks to a database directly. It opens a [`UnitOfWork`]
//! from a [`LedgerStore`], does all its reads, guard checks and writes
//! through it, then commits. A unit of work dropped without `commit` must
//! discard every write made through it.

use async_trait::async_trait;
use tally_shared::types::{AccountId, CategoryId, GroupId, TransactionId, UserId};

use super::balance::balance_of;
use super::error::StoreError;
use super::types::{Account, AccountBalance, Category, LinkCode, Transaction};
use crate::currency::ExchangeRate;

/// Factory for atomic units of work.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// The unit-of-work type this store hands out.
    type Unit: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Unit, StoreError>;
}

/// One atomic begin / N operations / commit-or-abort span.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Point lookup of an account, deleted or not.
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Point lookup of a category, deleted or not.
    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    /// Point lookup of an entry, deleted or not.
    async fn find_entry(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Like `find_entry`, but locks the row until the unit of work ends.
    async fn find_entry_for_update(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Every entry sharing `code`, deleted or not, locked for update.
    async fn find_entries_by_link(
        &mut self,
        code: &LinkCode,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Every entry booked against `account_id`, deleted or not.
    async fn list_account_entries(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// The full exchange rate table, deleted rows included.
    async fn list_exchange_rates(&mut self) -> Result<Vec<ExchangeRate>, StoreError>;

    /// Returns true if `user_id` belongs to `group_id`.
    async fn is_group_member(
        &mut self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<bool, StoreError>;

    /// Inserts a new entry.
    async fn insert_entry(&mut self, entry: &Transaction) -> Result<(), StoreError>;

    /// Overwrites an existing entry with `entry`.
    async fn update_entry(&mut self, entry: &Transaction) -> Result<(), StoreError>;

    /// Makes every write visible atomically.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write.
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Projects the current balance of `account` inside `uow`.
pub(crate) async fn project_balance<U: UnitOfWork>(
    uow: &mut U,
    account: Account,
) -> Result<AccountBalance, StoreError> {
    let entries = uow.list_account_entries(account.id).await?;
    let balance = balance_of(&account, &entries);
    Ok(AccountBalance { account, balance })
}
