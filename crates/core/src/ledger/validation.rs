//! Business rule validation for ledger mutations.

use super::error::LedgerError;
use super::types::Transaction;
use crate::money::TransactionType;

/// Validates a client-supplied magnitude.
///
/// # Errors
///
/// Returns `InvalidOperation` unless the amount is strictly positive.
pub fn validate_positive_amount(amount: i64) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::invalid("amount must be positive"));
    }
    Ok(())
}

/// Validates the transfer rules between an entry and its patched version.
///
/// A transfer leg cannot be retyped or acquire a category, and an ordinary
/// entry cannot become a transfer.
///
/// # Errors
///
/// Returns `InvalidOperation` naming the broken rule.
pub fn validate_transfer_rules(
    existing: &Transaction,
    merged: &Transaction,
) -> Result<(), LedgerError> {
    let was_transfer = existing.transaction_type == TransactionType::Transfer || existing.is_linked();

    if was_transfer {
        if merged.transaction_type != TransactionType::Transfer {
            return Err(LedgerError::invalid("transfer legs cannot be retyped"));
        }
        if merged.category_id.is_some() {
            return Err(LedgerError::invalid("transfer legs cannot have a category"));
        }
    } else if merged.transaction_type == TransactionType::Transfer {
        return Err(LedgerError::invalid(
            "entries cannot become transfers; create a transfer instead",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::{account, entry, transfer_leg};
    use tally_shared::types::{CategoryId, GroupId};

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(1).is_ok());
        assert!(validate_positive_amount(0).is_err());
        assert!(validate_positive_amount(-5).is_err());
    }

    #[test]
    fn test_transfer_cannot_be_retyped() {
        let acc = account(GroupId::new(), "USD", 0);
        let leg = transfer_leg(&acc, -500);
        let mut merged = leg.clone();
        merged.transaction_type = TransactionType::Expense;
        assert_eq!(
            validate_transfer_rules(&leg, &merged),
            Err(LedgerError::invalid("transfer legs cannot be retyped"))
        );
    }

    #[test]
    fn test_transfer_cannot_get_category() {
        let acc = account(GroupId::new(), "USD", 0);
        let leg = transfer_leg(&acc, -500);
        let mut merged = leg.clone();
        merged.category_id = Some(CategoryId::new());
        assert!(validate_transfer_rules(&leg, &merged).is_err());
    }

    #[test]
    fn test_entry_cannot_become_transfer() {
        let acc = account(GroupId::new(), "USD", 0);
        let expense = entry(&acc, -500);
        let mut merged = expense.clone();
        merged.transaction_type = TransactionType::Transfer;
        assert!(validate_transfer_rules(&expense, &merged).is_err());
    }

    #[test]
    fn test_ordinary_retype_allowed() {
        let acc = account(GroupId::new(), "USD", 0);
        let expense = entry(&acc, -500);
        let mut merged = expense.clone();
        merged.transaction_type = TransactionType::Income;
        merged.category_id = Some(CategoryId::new());
        assert!(validate_transfer_rules(&expense, &merged).is_ok());
    }
}
