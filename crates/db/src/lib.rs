//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - The PostgreSQL-backed ledger store
//! - Repository abstractions for accounts, groups and exchange rates

pub mod entities;
pub mod migration;
pub mod repositories;

mod mapping;

pub use repositories::{
    AccountRepository, ExchangeRateRepository, GroupRepository, SeaLedgerStore, SeaUnit,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_core::currency::RateResolver;
use tally_core::ledger::{LedgerEngine, MembershipGuard};
use tally_shared::AppConfig;
use tally_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Builds the PostgreSQL-backed ledger engine described by `config`.
#[must_use]
pub fn ledger_engine(
    db: DatabaseConnection,
    config: &AppConfig,
) -> LedgerEngine<SeaLedgerStore, MembershipGuard> {
    let store = SeaLedgerStore::with_isolation(db, config.database.isolation);
    LedgerEngine::new(store, MembershipGuard)
        .with_resolver(RateResolver::from_codes(&config.ledger.hub_currencies))
}
