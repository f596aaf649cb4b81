//! PostgreSQL-backed ledger store.
//!
//! Each unit of work is one database transaction. Entries about to be
//! mutated are read with `SELECT ... FOR UPDATE`, so two writers touching
//! the same pair serialize on the row locks whatever the isolation level.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, RuntimeErr, TransactionTrait,
};
use tally_core::currency::ExchangeRate;
use tally_core::ledger::{
    Account, AuditReport, Category, LedgerStore, LinkCode, StoreError, Transaction, UnitOfWork,
    audit_ledger,
};
use tally_shared::config::IsolationSetting;
use tally_shared::types::{AccountId, CategoryId, CurrencyCodeError, GroupId, TransactionId, UserId};
use tracing::{debug, warn};

use crate::entities::{accounts, categories, exchange_rates, group_members, transactions};
use crate::mapping::{
    account_from_model, category_from_model, entry_from_model, entry_to_active_model,
    rate_from_model,
};

/// SQLSTATE codes PostgreSQL raises when it aborts a transaction in favour
/// of a concurrent one.
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// Ledger store over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaLedgerStore {
    db: DatabaseConnection,
    isolation: IsolationLevel,
}

impl SeaLedgerStore {
    /// Creates a store whose units of work run at `READ COMMITTED`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            isolation: IsolationLevel::ReadCommitted,
        }
    }

    /// Creates a store using the configured isolation level.
    #[must_use]
    pub const fn with_isolation(db: DatabaseConnection, isolation: IsolationSetting) -> Self {
        Self {
            db,
            isolation: isolation_level(isolation),
        }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Audits every account and entry of `group_id`, deleted rows included.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a row cannot be decoded.
    pub async fn audit_group(&self, group_id: GroupId) -> Result<AuditReport, StoreError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::GroupId.eq(group_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(account_from_model)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt_row)?;

        let entries = transactions::Entity::find()
            .filter(transactions::Column::GroupId.eq(group_id.into_inner()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt_row)?;

        Ok(audit_ledger(&accounts, &entries))
    }
}

#[async_trait]
impl LedgerStore for SeaLedgerStore {
    type Unit = SeaUnit;

    async fn begin(&self) -> Result<SeaUnit, StoreError> {
        let txn = self
            .db
            .begin_with_config(Some(self.isolation), None)
            .await
            .map_err(store_error)?;
        Ok(SeaUnit { txn })
    }
}

/// A ledger unit of work wrapping one database transaction.
///
/// Dropping it without `commit` rolls the transaction back.
#[derive(Debug)]
pub struct SeaUnit {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for SeaUnit {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(account_from_model)
            .transpose()
            .map_err(corrupt_row)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let model = categories::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(model.map(category_from_model))
    }

    async fn find_entry(&mut self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(entry_from_model)
            .transpose()
            .map_err(corrupt_row)
    }

    async fn find_entry_for_update(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?
            .map(entry_from_model)
            .transpose()
            .map_err(corrupt_row)
    }

    async fn find_entries_by_link(
        &mut self,
        code: &LinkCode,
    ) -> Result<Vec<Transaction>, StoreError> {
        // Stable lock order across writers.
        transactions::Entity::find()
            .filter(transactions::Column::LinkCode.eq(code.as_str()))
            .order_by_asc(transactions::Column::Id)
            .lock_exclusive()
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt_row)
    }

    async fn list_account_entries(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(entry_from_model)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt_row)
    }

    async fn list_exchange_rates(&mut self) -> Result<Vec<ExchangeRate>, StoreError> {
        exchange_rates::Entity::find()
            .all(&self.txn)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(rate_from_model)
            .collect::<Result<Vec<_>, _>>()
            .map_err(corrupt_row)
    }

    async fn is_group_member(
        &mut self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let member = group_members::Entity::find_by_id((group_id.into_inner(), user_id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(member.is_some())
    }

    async fn insert_entry(&mut self, entry: &Transaction) -> Result<(), StoreError> {
        entry_to_active_model(entry)
            .insert(&self.txn)
            .await
            .map_err(store_error)?;
        debug!(entry_id = %entry.id, account_id = %entry.account_id, "Inserted ledger entry");
        Ok(())
    }

    async fn update_entry(&mut self, entry: &Transaction) -> Result<(), StoreError> {
        entry_to_active_model(entry)
            .update(&self.txn)
            .await
            .map_err(store_error)?;
        debug!(entry_id = %entry.id, "Updated ledger entry");
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_error)
    }
}

const fn isolation_level(setting: IsolationSetting) -> IsolationLevel {
    match setting {
        IsolationSetting::ReadCommitted => IsolationLevel::ReadCommitted,
        IsolationSetting::RepeatableRead => IsolationLevel::RepeatableRead,
        IsolationSetting::Serializable => IsolationLevel::Serializable,
    }
}

/// Returns the SQLSTATE code carried by `err`, if any.
fn sqlstate(err: &DbErr) -> Option<String> {
    let runtime = match err {
        DbErr::Conn(runtime) | DbErr::Exec(runtime) | DbErr::Query(runtime) => runtime,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned()),
        RuntimeErr::Internal(_) => None,
    }
}

/// Maps a database error onto the ledger's store error.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match sqlstate(&err) {
        Some(code) if RETRYABLE_SQLSTATES.contains(&code.as_str()) => {
            warn!(sqlstate = %code, error = %err, "Ledger transaction aborted by a concurrent writer");
            StoreError::Conflict(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn corrupt_row(err: CurrencyCodeError) -> StoreError {
    StoreError::Backend(format!("Corrupt ledger row: {err}"))
}
