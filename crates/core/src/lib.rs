//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached only through the [`ledger::LedgerStore`] seam.
//!
//! # Modules
//!
//! - `money` - Signed amounts and direction rules
//! - `currency` - Exchange rate resolution and conversion
//! - `ledger` - Balance projection, the mutation engine and the ledger audit
//! - `notify` - Post-commit change notifications

pub mod currency;
pub mod ledger;
pub mod money;
pub mod notify;
