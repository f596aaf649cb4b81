//! Ledger engine over PostgreSQL.
//!
//! Run with a migrated-or-empty database:
//! `DATABASE_URL=postgres://... cargo test -p tally-db -- --ignored`

#![allow(clippy::items_after_statements)]

mod common;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use tally_core::ledger::{
    CreateEntryInput, CreateTransferInput, EntryPatch, LedgerEngine, LedgerError,
    MembershipGuard,
};
use tally_core::money::TransactionType;
use tally_db::entities::{
    sea_orm_active_enums::{Direction, TransactionType as DbTransactionType},
    transactions,
};
use tally_db::repositories::CreateExchangeRateInput;
use tally_db::{AccountRepository, ExchangeRateRepository, SeaLedgerStore};
use tally_shared::config::IsolationSetting;
use tally_shared::types::{AccountId, UserId};
use uuid::Uuid;

use common::{Fixture, code};

fn engine(fixture: &Fixture) -> LedgerEngine<SeaLedgerStore, MembershipGuard> {
    tally_db::ledger_engine(fixture.db.clone(), &common::config())
}

fn transfer(from: AccountId, to: AccountId, amount: i64) -> CreateTransferInput {
    CreateTransferInput {
        from_account_id: from,
        to_account_id: to,
        amount,
        exchange_rate: None,
        memo: Some("move".to_string()),
        timestamp: Utc::now(),
    }
}

async fn balance(fixture: &Fixture, id: AccountId) -> i128 {
    AccountRepository::new(fixture.db.clone())
        .find_account(id)
        .await
        .unwrap()
        .unwrap()
        .balance
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_transfer_commits_both_legs() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 10_000).await;
    let savings = fixture.account("Savings", "USD", 0).await;

    let outcome = engine(&fixture)
        .create_transfer(transfer(checking.id, savings.id, 5_000), fixture.user_id)
        .await
        .unwrap();

    assert_eq!(outcome.source.amount, -5_000);
    assert_eq!(outcome.destination.amount, 5_000);
    assert_eq!(outcome.source.link_code, outcome.destination.link_code);
    assert_eq!(balance(&fixture, checking.id).await, 5_000);
    assert_eq!(balance(&fixture, savings.id).await, 5_000);

    let store = SeaLedgerStore::new(fixture.db.clone());
    assert!(store.audit_group(fixture.group_id).await.unwrap().is_clean());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_delete_one_leg_reverts_both() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 10_000).await;
    let savings = fixture.account("Savings", "USD", 0).await;
    let engine = engine(&fixture);

    let pair = engine
        .create_transfer(transfer(checking.id, savings.id, 5_000), fixture.user_id)
        .await
        .unwrap();
    let outcome = engine
        .delete_entry(pair.destination.id, fixture.user_id)
        .await
        .unwrap();

    let partner = outcome.partner.unwrap();
    assert_eq!(partner.id, pair.source.id);
    assert_eq!(partner.deleted_at, outcome.entry.deleted_at);
    assert_eq!(balance(&fixture, checking.id).await, 10_000);
    assert_eq!(balance(&fixture, savings.id).await, 0);

    engine
        .undelete_entry(pair.source.id, fixture.user_id)
        .await
        .unwrap();
    assert_eq!(balance(&fixture, checking.id).await, 5_000);
    assert_eq!(balance(&fixture, savings.id).await, 5_000);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_amount_update_mirrors_partner() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 10_000).await;
    let savings = fixture.account("Savings", "USD", 0).await;
    let engine = engine(&fixture);

    let pair = engine
        .create_transfer(transfer(checking.id, savings.id, 5_000), fixture.user_id)
        .await
        .unwrap();
    let patch = EntryPatch {
        amount: Some(7_000),
        ..EntryPatch::default()
    };
    let outcome = engine
        .update_entry(pair.source.id, patch, fixture.user_id)
        .await
        .unwrap();

    assert_eq!(outcome.entry.amount, -7_000);
    assert_eq!(outcome.partner.unwrap().amount, 7_000);
    assert_eq!(balance(&fixture, checking.id).await, 3_000);
    assert_eq!(balance(&fixture, savings.id).await, 7_000);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_cross_currency_transfer_uses_inverse_rate() {
    let fixture = Fixture::new().await;
    let euros = fixture.account("Euro wallet", "EUR", 10_000).await;
    let dollars = fixture.account("Dollar wallet", "USD", 0).await;

    ExchangeRateRepository::new(fixture.db.clone())
        .upsert_rate(CreateExchangeRateInput {
            from_currency: code("USD"),
            to_currency: code("EUR"),
            rate: dec!(0.90),
            effective_date: Utc::now().date_naive(),
        })
        .await
        .unwrap();

    let outcome = engine(&fixture)
        .create_transfer(transfer(euros.id, dollars.id, 4_500), fixture.user_id)
        .await
        .unwrap();

    assert_eq!(outcome.source.amount, -4_500);
    assert_eq!(outcome.destination.amount, 5_000);
    assert_eq!(outcome.destination.original_currency, Some(code("EUR")));
    assert_eq!(outcome.destination.original_amount, Some(4_500));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_transfer_leaves_no_rows() {
    let fixture = Fixture::new().await;
    let rupiah = fixture.account("Rupiah", "IDR", 1_000_000).await;
    let rupees = fixture.account("Rupees", "INR", 0).await;

    let err = engine(&fixture)
        .create_transfer(transfer(rupiah.id, rupees.id, 50_000), fixture.user_id)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::RateNotFound { .. }));
    let report = SeaLedgerStore::new(fixture.db.clone())
        .audit_group(fixture.group_id)
        .await
        .unwrap();
    assert_eq!(report.entries_checked, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_outsider_is_denied() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 0).await;

    let input = CreateEntryInput {
        account_id: checking.id,
        category_id: None,
        transaction_type: TransactionType::Expense,
        amount: 1_200,
        memo: None,
        timestamp: Utc::now(),
    };
    let err = engine(&fixture)
        .create_entry(input, UserId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::AccessDenied(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_updates_keep_pair_consistent() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 100_000).await;
    let savings = fixture.account("Savings", "USD", 0).await;
    let store = SeaLedgerStore::with_isolation(fixture.db.clone(), IsolationSetting::ReadCommitted);
    let engine = LedgerEngine::new(store.clone(), MembershipGuard);

    let pair = engine
        .create_transfer(transfer(checking.id, savings.id, 5_000), fixture.user_id)
        .await
        .unwrap();

    let updates = (1..=10i64).map(|i| {
        let engine = engine.clone();
        let target = if i % 2 == 0 { pair.source.id } else { pair.destination.id };
        let user = fixture.user_id;
        tokio::spawn(async move {
            // Opposite legs lock in opposite order; a deadlock victim retries.
            loop {
                let patch = EntryPatch {
                    amount: Some(i * 1_000),
                    ..EntryPatch::default()
                };
                match engine.update_entry(target, patch, user).await {
                    Err(err) if err.is_retryable() => {}
                    other => break other,
                }
            }
        })
    });
    for result in join_all(updates).await {
        result.unwrap().unwrap();
    }

    let report = store.audit_group(fixture.group_id).await.unwrap();
    assert!(report.is_clean(), "{:?}", report.findings);
    let total = balance(&fixture, checking.id).await + balance(&fixture, savings.id).await;
    assert_eq!(total, 100_000);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_sign_check_constraint() {
    let fixture = Fixture::new().await;
    let checking = fixture.account("Checking", "USD", 0).await;
    let now = Utc::now().into();

    let result = transactions::ActiveModel {
        id: Set(Uuid::now_v7()),
        group_id: Set(fixture.group_id.into_inner()),
        account_id: Set(checking.id.into_inner()),
        category_id: Set(None),
        transaction_type: Set(DbTransactionType::Expense),
        direction: Set(Direction::MoneyIn),
        amount: Set(-500),
        link_code: Set(None),
        original_currency: Set(None),
        original_amount: Set(None),
        memo: Set(None),
        occurred_at: Set(now),
        created_by: Set(fixture.user_id.into_inner()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(&fixture.db)
    .await;

    assert!(result.is_err());
}
