//! Conversions between `SeaORM` models and ledger domain types.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use tally_core::currency::ExchangeRate;
use tally_core::ledger::{Account, Category, LinkCode, Transaction};
use tally_shared::types::{CurrencyCode, CurrencyCodeError};

use crate::entities::{accounts, categories, exchange_rates, transactions};

fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

pub(crate) fn account_from_model(model: accounts::Model) -> Result<Account, CurrencyCodeError> {
    Ok(Account {
        id: model.id.into(),
        group_id: model.group_id.into(),
        currency: CurrencyCode::new(&model.currency)?,
        name: model.name,
        starting_balance: model.starting_balance,
        deleted_at: model.deleted_at.map(utc),
    })
}

pub(crate) fn category_from_model(model: categories::Model) -> Category {
    Category {
        id: model.id.into(),
        group_id: model.group_id.into(),
        name: model.name,
        deleted_at: model.deleted_at.map(utc),
    }
}

pub(crate) fn entry_from_model(model: transactions::Model) -> Result<Transaction, CurrencyCodeError> {
    let original_currency = model
        .original_currency
        .as_deref()
        .map(CurrencyCode::new)
        .transpose()?;

    Ok(Transaction {
        id: model.id.into(),
        group_id: model.group_id.into(),
        account_id: model.account_id.into(),
        category_id: model.category_id.map(Into::into),
        transaction_type: model.transaction_type.into(),
        direction: model.direction.into(),
        amount: model.amount,
        link_code: model.link_code.map(LinkCode::new),
        original_currency,
        original_amount: model.original_amount,
        memo: model.memo,
        timestamp: utc(model.occurred_at),
        created_by: model.created_by.into(),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
        deleted_at: model.deleted_at.map(utc),
    })
}

/// Every column set, so the same model serves insert and full overwrite.
pub(crate) fn entry_to_active_model(entry: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(entry.id.into_inner()),
        group_id: Set(entry.group_id.into_inner()),
        account_id: Set(entry.account_id.into_inner()),
        category_id: Set(entry.category_id.map(|id| id.into_inner())),
        transaction_type: Set(entry.transaction_type.into()),
        direction: Set(entry.direction.into()),
        amount: Set(entry.amount),
        link_code: Set(entry.link_code.as_ref().map(|code| code.as_str().to_string())),
        original_currency: Set(entry.original_currency.as_ref().map(|c| c.as_str().to_string())),
        original_amount: Set(entry.original_amount),
        memo: Set(entry.memo.clone()),
        occurred_at: Set(entry.timestamp.into()),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.into()),
        updated_at: Set(entry.updated_at.into()),
        deleted_at: Set(entry.deleted_at.map(Into::into)),
    }
}

pub(crate) fn rate_from_model(model: exchange_rates::Model) -> Result<ExchangeRate, CurrencyCodeError> {
    Ok(ExchangeRate {
        id: model.id.into(),
        from_currency: CurrencyCode::new(&model.from_currency)?,
        to_currency: CurrencyCode::new(&model.to_currency)?,
        rate: model.rate,
        effective_date: model.effective_date,
        deleted_at: model.deleted_at.map(utc),
    })
}
