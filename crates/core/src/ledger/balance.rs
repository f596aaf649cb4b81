//! Balance projection.
//!
//! A balance is never stored. It is always `starting_balance` plus the sum of
//! the account's live entries, folded on demand.

use std::collections::HashMap;

use tally_shared::types::AccountId;

use super::types::{Account, AccountBalance, Transaction};

/// Returns the projected balance of `account`.
///
/// Entries booked against other accounts and soft-deleted entries are
/// ignored.
#[must_use]
pub fn balance_of(account: &Account, entries: &[Transaction]) -> i128 {
    entries
        .iter()
        .filter(|e| e.account_id == account.id && !e.is_deleted())
        .fold(i128::from(account.starting_balance), |acc, e| {
            acc + i128::from(e.amount)
        })
}

/// Projects the balances of many accounts in a single pass over `entries`.
///
/// Every account in `accounts` appears in the result, even with no entries.
#[must_use]
pub fn balances_by_account(
    accounts: &[Account],
    entries: &[Transaction],
) -> HashMap<AccountId, i128> {
    let mut balances: HashMap<AccountId, i128> = accounts
        .iter()
        .map(|a| (a.id, i128::from(a.starting_balance)))
        .collect();

    for entry in entries.iter().filter(|e| !e.is_deleted()) {
        if let Some(balance) = balances.get_mut(&entry.account_id) {
            *balance += i128::from(entry.amount);
        }
    }

    balances
}

/// Pairs each account with its projected balance, keeping input order.
#[must_use]
pub fn with_balances(accounts: Vec<Account>, entries: &[Transaction]) -> Vec<AccountBalance> {
    let balances = balances_by_account(&accounts, entries);
    accounts
        .into_iter()
        .map(|account| {
            let balance = balances
                .get(&account.id)
                .copied()
                .unwrap_or_else(|| i128::from(account.starting_balance));
            AccountBalance { account, balance }
        })
        .collect()
}
