//! Row builders shared by the ledger unit tests.

use chrono::Utc;
use tally_shared::types::{AccountId, CurrencyCode, GroupId, TransactionId, UserId};

use super::types::{Account, LinkCode, Transaction};
use crate::money::{Direction, TransactionType};

pub fn account(group_id: GroupId, currency: &str, starting_balance: i64) -> Account {
    Account {
        id: AccountId::new(),
        group_id,
        currency: CurrencyCode::new(currency).unwrap(),
        name: format!("{currency} account"),
        starting_balance,
        deleted_at: None,
    }
}

/// Expense for negative amounts, income for positive ones.
pub fn entry(account: &Account, amount: i64) -> Transaction {
    let (transaction_type, direction) = if amount < 0 {
        (TransactionType::Expense, Direction::MoneyOut)
    } else {
        (TransactionType::Income, Direction::MoneyIn)
    };
    let now = Utc::now();
    Transaction {
        id: TransactionId::new(),
        group_id: account.group_id,
        account_id: account.id,
        category_id: None,
        transaction_type,
        direction,
        amount,
        link_code: None,
        original_currency: None,
        original_amount: None,
        memo: None,
        timestamp: now,
        created_by: UserId::new(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn transfer_leg(account: &Account, amount: i64) -> Transaction {
    Transaction {
        transaction_type: TransactionType::Transfer,
        link_code: Some(LinkCode::generate()),
        ..entry(account, amount)
    }
}
