//! Ledger consistency.
//!
//! This module keeps per-account balances, signed amounts and transfer pairs
//! correct under every mutation:
//! - Domain types and mutation inputs/outcomes
//! - Balance projection
//! - Store and guard seams, with an in-memory store
//! - The mutation engine
//! - An offline audit of stored rows

pub mod audit;
pub mod balance;
pub mod engine;
pub mod error;
pub mod guard;
pub mod memory;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
pub(crate) mod test_support;

pub use audit::{AuditFinding, AuditReport, audit_ledger};
pub use balance::{balance_of, balances_by_account, with_balances};
pub use engine::LedgerEngine;
pub use error::{LedgerError, StoreError};
pub use guard::{Candidate, EntityRef, LegitimacyGuard, MembershipGuard};
pub use memory::InMemoryLedgerStore;
pub use store::{LedgerStore, UnitOfWork};
pub use types::{
    Account, AccountBalance, Category, CreateEntryInput, CreateTransferInput, EntryPatch,
    LedgerOutcome, LinkCode, Transaction, TransferOutcome,
};
