//! Domain types for ledger mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CategoryId, CurrencyCode, GroupId, TransactionId, UserId};

use crate::money::{Direction, TransactionType};

/// A money-holding account owned by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning group.
    pub group_id: GroupId,
    /// Currency every entry on this account is denominated in.
    pub currency: CurrencyCode,
    /// Display name.
    pub name: String,
    /// Opening balance in minor units. Immutable after creation.
    pub starting_balance: i64,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Returns true if the account has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Spending/earning category owned by a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Owning group.
    pub group_id: GroupId,
    /// Display name.
    pub name: String,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Opaque code shared by the two legs of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkCode(String);

impl LinkCode {
    /// Generates a fresh code with 256 bits of entropy.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(base64_url::encode(&bytes))
    }

    /// Wraps an existing code (e.g. loaded from storage).
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LinkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ledger entry.
///
/// `amount` is signed: negative for money out, positive for money in, never
/// zero. Transfer legs carry a [`LinkCode`] and never a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Entry ID.
    pub id: TransactionId,
    /// Owning group.
    pub group_id: GroupId,
    /// Account the amount is booked against.
    pub account_id: AccountId,
    /// Optional category; always `None` on transfer legs.
    pub category_id: Option<CategoryId>,
    /// Entry kind.
    pub transaction_type: TransactionType,
    /// Money direction relative to the account.
    pub direction: Direction,
    /// Signed amount in the account currency's minor unit.
    pub amount: i64,
    /// Shared code of a transfer pair.
    pub link_code: Option<LinkCode>,
    /// Source currency on the destination leg of a cross-currency transfer.
    pub original_currency: Option<CurrencyCode>,
    /// Source amount on the destination leg of a cross-currency transfer.
    pub original_amount: Option<i64>,
    /// Free-text note.
    pub memo: Option<String>,
    /// When the money moved, as entered by the user.
    pub timestamp: DateTime<Utc>,
    /// Actor that created the entry.
    pub created_by: UserId,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Returns true if the entry has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the entry is one leg of a transfer pair.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.link_code.is_some()
    }
}

/// Input for a single EXPENSE or INCOME entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryInput {
    /// Account to book against.
    pub account_id: AccountId,
    /// Optional category.
    pub category_id: Option<CategoryId>,
    /// EXPENSE or INCOME.
    pub transaction_type: TransactionType,
    /// Positive magnitude; the sign is derived from the type.
    pub amount: i64,
    /// Free-text note.
    pub memo: Option<String>,
    /// When the money moved.
    pub timestamp: DateTime<Utc>,
}

/// Input for a transfer between two accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransferInput {
    /// Account money leaves.
    pub from_account_id: AccountId,
    /// Account money enters.
    pub to_account_id: AccountId,
    /// Positive magnitude in the source account's currency.
    pub amount: i64,
    /// Explicit rate (1 source = rate destination); resolved from the rate table when absent.
    pub exchange_rate: Option<Decimal>,
    /// Free-text note copied to both legs.
    pub memo: Option<String>,
    /// When the money moved.
    pub timestamp: DateTime<Utc>,
}

/// Partial update of an entry. `None` leaves a field untouched.
///
/// Nullable fields use a nested option: `Some(None)` clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPatch {
    /// Move the entry to another account.
    pub account_id: Option<AccountId>,
    /// Set or clear the category.
    pub category_id: Option<Option<CategoryId>>,
    /// Retype the entry.
    pub transaction_type: Option<TransactionType>,
    /// Flip the direction.
    pub direction: Option<Direction>,
    /// New magnitude; any sign is ignored.
    pub amount: Option<i64>,
    /// Set or clear the memo.
    pub memo: Option<Option<String>>,
    /// New user-facing time.
    pub timestamp: Option<DateTime<Utc>>,
}

impl EntryPatch {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.category_id.is_none()
            && self.transaction_type.is_none()
            && self.direction.is_none()
            && self.amount.is_none()
            && self.memo.is_none()
            && self.timestamp.is_none()
    }
}

/// An account together with its projected balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account row.
    pub account: Account,
    /// `starting_balance` plus every live entry amount.
    pub balance: i128,
}

/// Result of a single-entry mutation (create, update, delete, undelete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutcome {
    /// The entry the operation targeted, as committed.
    pub entry: Transaction,
    /// The transfer partner, when the operation touched it.
    pub partner: Option<Transaction>,
    /// Balances of every account the operation affected.
    pub balances: Vec<AccountBalance>,
}

/// Result of creating a transfer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// The MONEY_OUT leg.
    pub source: Transaction,
    /// The MONEY_IN leg.
    pub destination: Transaction,
    /// Balances of both accounts after the transfer.
    pub balances: Vec<AccountBalance>,
}
