//! Property-based tests for sign correction.

use proptest::prelude::*;

use super::sign::{Direction, TransactionType, correct_sign, direction_for_type};

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::MoneyIn), Just(Direction::MoneyOut)]
}

fn type_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![
        Just(TransactionType::Expense),
        Just(TransactionType::Income),
        Just(TransactionType::Transfer),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A corrected non-zero amount always agrees with its direction.
    #[test]
    fn prop_corrected_sign_agrees(
        amount in any::<i64>().prop_filter("non-zero", |a| *a != 0),
        direction in direction_strategy(),
    ) {
        let corrected = correct_sign(amount, direction);
        prop_assert!(direction.agrees_with(corrected));
        prop_assert_eq!(Direction::from_amount(corrected), Some(direction));
    }

    /// Correction preserves magnitude (except the saturated minimum).
    #[test]
    fn prop_magnitude_preserved(
        amount in (i64::MIN + 1)..=i64::MAX,
        direction in direction_strategy(),
    ) {
        prop_assert_eq!(correct_sign(amount, direction).abs(), amount.abs());
    }

    /// Correcting twice is the same as correcting once.
    #[test]
    fn prop_idempotent(amount in any::<i64>(), direction in direction_strategy()) {
        let once = correct_sign(amount, direction);
        prop_assert_eq!(correct_sign(once, direction), once);
    }

    /// Opposite directions give opposite amounts.
    #[test]
    fn prop_opposite_direction_negates(
        amount in (i64::MIN + 1)..=i64::MAX,
        direction in direction_strategy(),
    ) {
        prop_assert_eq!(
            correct_sign(amount, direction.opposite()),
            -correct_sign(amount, direction)
        );
    }

    /// Income is the only type that defaults to money in.
    #[test]
    fn prop_type_mapping_total(transaction_type in type_strategy()) {
        let direction = direction_for_type(transaction_type);
        prop_assert_eq!(
            direction == Direction::MoneyIn,
            transaction_type == TransactionType::Income
        );
    }
}
