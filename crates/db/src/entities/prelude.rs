//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::categories::Entity as Categories;
pub use super::currencies::Entity as Currencies;
pub use super::exchange_rates::Entity as ExchangeRates;
pub use super::group_members::Entity as GroupMembers;
pub use super::groups::Entity as Groups;
pub use super::transactions::Entity as Transactions;
