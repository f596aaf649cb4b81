//! Account, group and exchange rate repositories over PostgreSQL.

mod common;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tally_core::currency::RateLookupMethod;
use tally_db::repositories::{
    AccountError, CreateAccountInput, CreateExchangeRateInput, ExchangeRateError,
};
use tally_db::{AccountRepository, ExchangeRateRepository, GroupRepository};
use tally_shared::types::{AccountId, ExchangeRateId, GroupId};

use common::{Fixture, code};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_create_account_validates_currency_and_group() {
    let fixture = Fixture::new().await;
    let repo = AccountRepository::new(fixture.db.clone());

    let err = repo
        .create_account(CreateAccountInput {
            group_id: fixture.group_id,
            currency: code("XYZ"),
            name: "Mystery".to_string(),
            starting_balance: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::CurrencyNotFound(ref c) if c == "XYZ"));

    let err = repo
        .create_account(CreateAccountInput {
            group_id: GroupId::new(),
            currency: code("USD"),
            name: "Orphan".to_string(),
            starting_balance: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::GroupNotFound(_)));

    let err = repo
        .create_account(CreateAccountInput {
            group_id: fixture.group_id,
            currency: code("USD"),
            name: "   ".to_string(),
            starting_balance: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::EmptyName));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_list_and_delete_accounts() {
    let fixture = Fixture::new().await;
    let repo = AccountRepository::new(fixture.db.clone());
    let checking = fixture.account("Checking", "USD", 12_345).await;
    let savings = fixture.account("Savings", "USD", -5).await;

    let listed = repo.list_accounts(fixture.group_id, false).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].account.id, checking.id);
    assert_eq!(listed[0].balance, 12_345);
    assert_eq!(listed[1].balance, -5);

    repo.delete_account(savings.id).await.unwrap();
    assert!(matches!(
        repo.delete_account(savings.id).await,
        Err(AccountError::AlreadyDeleted(_))
    ));
    assert!(matches!(
        repo.delete_account(AccountId::new()).await,
        Err(AccountError::AccountNotFound(_))
    ));

    let live = repo.list_accounts(fixture.group_id, false).await.unwrap();
    assert_eq!(live.len(), 1);
    let all = repo.list_accounts(fixture.group_id, true).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(repo.find_account(savings.id).await.unwrap().unwrap().account.is_deleted());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_groups_and_categories() {
    let fixture = Fixture::new().await;
    let repo = GroupRepository::new(fixture.db.clone());

    assert!(repo.list_group_ids().await.unwrap().contains(&fixture.group_id));

    let groceries = repo.create_category(fixture.group_id, "Groceries").await.unwrap();
    repo.create_category(fixture.group_id, "Bills").await.unwrap();
    let names: Vec<String> = repo
        .list_categories(fixture.group_id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Bills", "Groceries"]);
    assert_eq!(groceries.group_id, fixture.group_id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_rate_upsert_validation() {
    let db = common::connect().await;
    let repo = ExchangeRateRepository::new(db);

    let input = |from: &str, to: &str, rate| CreateExchangeRateInput {
        from_currency: code(from),
        to_currency: code(to),
        rate,
        effective_date: date(1),
    };

    assert!(matches!(
        repo.upsert_rate(input("GBP", "CAD", dec!(0))).await,
        Err(ExchangeRateError::NonPositiveRate)
    ));
    assert!(matches!(
        repo.upsert_rate(input("GBP", "GBP", dec!(1))).await,
        Err(ExchangeRateError::SameCurrency)
    ));
    assert!(matches!(
        repo.upsert_rate(input("GBP", "XYZ", dec!(1))).await,
        Err(ExchangeRateError::CurrencyNotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_rate_upsert_replaces_and_delete_hides() {
    let db = common::connect().await;
    let repo = ExchangeRateRepository::new(db);
    let input = |rate| CreateExchangeRateInput {
        from_currency: code("AUD"),
        to_currency: code("SGD"),
        rate,
        effective_date: date(2),
    };

    let first = repo.upsert_rate(input(dec!(0.88))).await.unwrap();
    let second = repo.upsert_rate(input(dec!(0.89))).await.unwrap();
    assert_eq!(first.id, second.id);

    let resolved = repo.resolve_rate(&code("AUD"), &code("SGD")).await.unwrap();
    assert_eq!(resolved.rate, dec!(0.89));
    assert_eq!(resolved.method, RateLookupMethod::Direct);

    let inverse = repo.resolve_rate(&code("SGD"), &code("AUD")).await.unwrap();
    assert_eq!(inverse.method, RateLookupMethod::Inverse);

    repo.delete_rate(second.id).await.unwrap();
    assert!(matches!(
        repo.delete_rate(second.id).await,
        Err(ExchangeRateError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete_rate(ExchangeRateId::new()).await,
        Err(ExchangeRateError::NotFound(_))
    ));
    assert!(repo.list_rates().await.unwrap().iter().all(|r| r.id != second.id));
}
