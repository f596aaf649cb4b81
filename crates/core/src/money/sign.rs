//! Sign correction for ledger amounts.

use serde::{Deserialize, Serialize};

/// Which way money moves relative to the entry's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Money enters the account; stored amount is positive.
    MoneyIn,
    /// Money leaves the account; stored amount is negative.
    MoneyOut,
}

impl Direction {
    /// Returns the other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::MoneyIn => Self::MoneyOut,
            Self::MoneyOut => Self::MoneyIn,
        }
    }

    /// Infers the direction a non-zero signed amount implies.
    ///
    /// Returns `None` for zero.
    #[must_use]
    pub const fn from_amount(amount: i64) -> Option<Self> {
        if amount > 0 {
            Some(Self::MoneyIn)
        } else if amount < 0 {
            Some(Self::MoneyOut)
        } else {
            None
        }
    }

    /// Returns true if `amount` carries the sign this direction requires.
    #[must_use]
    pub const fn agrees_with(self, amount: i64) -> bool {
        match self {
            Self::MoneyIn => amount > 0,
            Self::MoneyOut => amount < 0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoneyIn => f.write_str("MONEY_IN"),
            Self::MoneyOut => f.write_str("MONEY_OUT"),
        }
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Spending; counted in profit/loss.
    Expense,
    /// Earnings; counted in profit/loss.
    Income,
    /// One leg of a movement between two accounts; excluded from profit/loss.
    Transfer,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expense => f.write_str("EXPENSE"),
            Self::Income => f.write_str("INCOME"),
            Self::Transfer => f.write_str("TRANSFER"),
        }
    }
}

/// Returns the direction an entry of the given type defaults to.
///
/// Transfers default to `MoneyOut`; the destination leg of a pair is written
/// with the opposite direction explicitly.
#[must_use]
pub const fn direction_for_type(transaction_type: TransactionType) -> Direction {
    match transaction_type {
        TransactionType::Income => Direction::MoneyIn,
        TransactionType::Expense | TransactionType::Transfer => Direction::MoneyOut,
    }
}

/// Returns `amount` with the sign `direction` requires.
///
/// Zero stays zero. `i64::MIN` has no positive counterpart and saturates to
/// a magnitude of `i64::MAX`.
#[must_use]
pub fn correct_sign(amount: i64, direction: Direction) -> i64 {
    let magnitude = i64::try_from(amount.unsigned_abs()).unwrap_or(i64::MAX);
    match direction {
        Direction::MoneyIn => magnitude,
        Direction::MoneyOut => -magnitude,
    }
}
