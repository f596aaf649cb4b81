//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod categories;
pub mod currencies;
pub mod exchange_rates;
pub mod group_members;
pub mod groups;
pub mod sea_orm_active_enums;
pub mod transactions;
