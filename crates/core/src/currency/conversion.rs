//! Currency conversion logic.
//!
//! CRITICAL: Amounts are integers in the currency's minor unit. Conversion is
//! the one lossy step: the product is rounded half away from zero back to a
//! whole minor unit.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;

/// Converts a minor-unit amount using the given exchange rate.
///
/// Returns `None` if the product does not fit in an `i64`.
#[must_use]
pub fn convert_minor_units(amount: i64, rate: Decimal) -> Option<i64> {
    let converted = Decimal::from(amount).checked_mul(rate)?;
    converted
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
