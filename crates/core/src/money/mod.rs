//! Signed minor-unit amounts and direction rules.
//!
//! Every write path derives the stored sign from the entry direction through
//! this module; client-supplied signs are never persisted as-is.

pub mod sign;

#[cfg(test)]
mod sign_props;

pub use sign::{Direction, TransactionType, correct_sign, direction_for_type};
