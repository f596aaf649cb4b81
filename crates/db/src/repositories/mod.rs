//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod exchange_rate;
pub mod group;
pub mod ledger;

pub use account::{AccountError, AccountRepository, CreateAccountInput};
pub use exchange_rate::{CreateExchangeRateInput, ExchangeRateError, ExchangeRateRepository};
pub use group::GroupRepository;
pub use ledger::{SeaLedgerStore, SeaUnit};
