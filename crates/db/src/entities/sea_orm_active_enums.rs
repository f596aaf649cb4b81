//! PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::money;

/// `transaction_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// Spending.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// Earnings.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Transfer leg.
    #[sea_orm(string_value = "TRANSFER")]
    Transfer,
}

/// `direction` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "direction")]
pub enum Direction {
    /// Positive amounts.
    #[sea_orm(string_value = "MONEY_IN")]
    MoneyIn,
    /// Negative amounts.
    #[sea_orm(string_value = "MONEY_OUT")]
    MoneyOut,
}

impl From<TransactionType> for money::TransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Expense => Self::Expense,
            TransactionType::Income => Self::Income,
            TransactionType::Transfer => Self::Transfer,
        }
    }
}

impl From<money::TransactionType> for TransactionType {
    fn from(value: money::TransactionType) -> Self {
        match value {
            money::TransactionType::Expense => Self::Expense,
            money::TransactionType::Income => Self::Income,
            money::TransactionType::Transfer => Self::Transfer,
        }
    }
}

impl From<Direction> for money::Direction {
    fn from(value: Direction) -> Self {
        match value {
            Direction::MoneyIn => Self::MoneyIn,
            Direction::MoneyOut => Self::MoneyOut,
        }
    }
}

impl From<money::Direction> for Direction {
    fn from(value: money::Direction) -> Self {
        match value {
            money::Direction::MoneyIn => Self::MoneyIn,
            money::Direction::MoneyOut => Self::MoneyOut,
        }
    }
}
