//! Property-based tests for rate resolution and conversion.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::CurrencyCode;

use super::conversion::convert_minor_units;
use super::exchange::ExchangeRate;
use super::resolver::{RateLookupMethod, RateResolver};

/// Positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Minor-unit amounts well inside i64.
fn amount() -> impl Strategy<Value = i64> {
    -1_000_000_000_000i64..1_000_000_000_000i64
}

fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).expect("valid code")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("valid date")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Resolving the same pair twice over the same table gives the same answer.
    #[test]
    fn prop_resolution_is_deterministic(
        r1 in positive_rate(),
        r2 in positive_rate(),
        r3 in positive_rate(),
    ) {
        let rates = vec![
            ExchangeRate::new(code("SGD"), code("USD"), r1, day(1)),
            ExchangeRate::new(code("USD"), code("IDR"), r2, day(1)),
            ExchangeRate::new(code("IDR"), code("EUR"), r3, day(2)),
        ];
        let resolver = RateResolver::default();
        let first = resolver.resolve(&code("SGD"), &code("IDR"), &rates);
        let second = resolver.resolve(&code("SGD"), &code("IDR"), &rates);
        prop_assert_eq!(first, second);
    }

    /// A direct row and its inverse lookup multiply to one (within precision).
    #[test]
    fn prop_inverse_is_reciprocal(rate in positive_rate()) {
        let rates = vec![ExchangeRate::new(code("USD"), code("EUR"), rate, day(1))];
        let resolver = RateResolver::default();
        let forward = resolver.resolve(&code("USD"), &code("EUR"), &rates).unwrap();
        let backward = resolver.resolve(&code("EUR"), &code("USD"), &rates).unwrap();
        prop_assert_eq!(forward.method, RateLookupMethod::Direct);
        prop_assert_eq!(backward.method, RateLookupMethod::Inverse);

        let product = forward.rate * backward.rate;
        let diff = (product - Decimal::ONE).abs();
        prop_assert!(diff < Decimal::new(1, 20), "product = {}", product);
    }

    /// The latest effective row for a pair always wins, regardless of order.
    #[test]
    fn prop_latest_row_wins(
        old_rate in positive_rate(),
        new_rate in positive_rate(),
        reversed in any::<bool>(),
    ) {
        let mut rates = vec![
            ExchangeRate::new(code("USD"), code("JPY"), old_rate, day(1)),
            ExchangeRate::new(code("USD"), code("JPY"), new_rate, day(5)),
        ];
        if reversed {
            rates.reverse();
        }
        let resolved = RateResolver::default()
            .resolve(&code("USD"), &code("JPY"), &rates)
            .unwrap();
        prop_assert_eq!(resolved.rate, new_rate);
    }

    /// Conversion at rate 1 is the identity.
    #[test]
    fn prop_unit_rate_is_identity(value in amount()) {
        prop_assert_eq!(convert_minor_units(value, Decimal::ONE), Some(value));
    }

    /// Converting a negated amount negates the result.
    #[test]
    fn prop_conversion_is_odd(value in amount(), rate in positive_rate()) {
        let pos = convert_minor_units(value, rate);
        let neg = convert_minor_units(-value, rate);
        prop_assert_eq!(pos.map(|v| -v), neg);
    }

    /// Conversion never moves more than half a minor unit from the exact product.
    #[test]
    fn prop_rounding_error_bounded(value in amount(), rate in positive_rate()) {
        let exact = Decimal::from(value) * rate;
        let rounded = convert_minor_units(value, rate).unwrap();
        let error = (Decimal::from(rounded) - exact).abs();
        prop_assert!(error <= Decimal::new(5, 1));
    }
}
