//! Account repository.
//!
//! Balances are never stored: every read projects them from the starting
//! balance and the account's live entries.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::ledger::{Account, AccountBalance, balance_of, with_balances};
use tally_shared::types::{AccountId, CurrencyCode, CurrencyCodeError, GroupId};
use tracing::info;
use uuid::Uuid;

use crate::entities::{accounts, currencies, groups, transactions};
use crate::mapping::{account_from_model, entry_from_model};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account name is blank.
    #[error("Account name must not be empty")]
    EmptyName,

    /// Owning group does not exist.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// Currency not found.
    #[error("Currency '{0}' not found")]
    CurrencyNotFound(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is already soft-deleted.
    #[error("Account already deleted: {0}")]
    AlreadyDeleted(Uuid),

    /// A stored row failed to decode.
    #[error("Corrupt account row: {0}")]
    CorruptRow(#[from] CurrencyCodeError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning group.
    pub group_id: GroupId,
    /// Account currency.
    pub currency: CurrencyCode,
    /// Display name.
    pub name: String,
    /// Opening balance in minor units.
    pub starting_balance: i64,
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account after checking its group and currency exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is blank
    /// - The group does not exist
    /// - The currency does not exist
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AccountError::EmptyName);
        }

        let group_id = input.group_id.into_inner();
        if groups::Entity::find_by_id(group_id).one(&self.db).await?.is_none() {
            return Err(AccountError::GroupNotFound(group_id));
        }

        let currency = currencies::Entity::find_by_id(input.currency.as_str().to_string())
            .one(&self.db)
            .await?;
        if currency.is_none() {
            return Err(AccountError::CurrencyNotFound(input.currency.to_string()));
        }

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            group_id: Set(group_id),
            currency: Set(input.currency.to_string()),
            name: Set(name.to_string()),
            starting_balance: Set(input.starting_balance),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let account = account_from_model(account.insert(&self.db).await?)?;
        info!(account_id = %account.id, group_id = %account.group_id, currency = %account.currency, "Account created");
        Ok(account)
    }

    /// Finds an account by ID with its projected balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_account(&self, id: AccountId) -> Result<Option<AccountBalance>, AccountError> {
        let Some(model) = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let account = account_from_model(model)?;

        let entries = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        let balance = balance_of(&account, &entries);
        Ok(Some(AccountBalance { account, balance }))
    }

    /// Lists a group's accounts with projected balances.
    ///
    /// Entries are fetched once for the whole group and folded per account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        group_id: GroupId,
        include_deleted: bool,
    ) -> Result<Vec<AccountBalance>, AccountError> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::GroupId.eq(group_id.into_inner()))
            .order_by_asc(accounts::Column::Name);
        if !include_deleted {
            query = query.filter(accounts::Column::DeletedAt.is_null());
        }

        let accounts = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(account_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        let entries = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(group_id.into_inner()))
            .filter(transactions::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(with_balances(accounts, &entries))
    }

    /// Soft-deletes an account. Its entries stay; new ones are refused.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or is already deleted.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AccountError> {
        let uuid = id.into_inner();
        let account = accounts::Entity::find_by_id(uuid)
            .one(&self.db)
            .await?
            .ok_or(AccountError::AccountNotFound(uuid))?;

        if account.deleted_at.is_some() {
            return Err(AccountError::AlreadyDeleted(uuid));
        }

        let now = chrono::Utc::now().into();
        let mut active: accounts::ActiveModel = account.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        info!(account_id = %id, "Account deleted");
        Ok(())
    }
}
