//! Exchange rate rows.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CurrencyCode, ExchangeRateId};

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Row identifier.
    pub id: ExchangeRateId,
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ExchangeRate {
    /// Creates a new, live exchange rate.
    #[must_use]
    pub fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            id: ExchangeRateId::new(),
            from_currency,
            to_currency,
            rate,
            effective_date,
            deleted_at: None,
        }
    }

    /// Returns true if this row takes part in rate resolution.
    ///
    /// Deleted rows and non-positive rates are ignored.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.deleted_at.is_none() && self.rate > Decimal::ZERO
    }

    /// Returns true if this row converts `from` into `to`.
    #[must_use]
    pub fn converts(&self, from: &CurrencyCode, to: &CurrencyCode) -> bool {
        &self.from_currency == from && &self.to_currency == to
    }

    /// Returns the inverse rate, or `None` if the rate is zero.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            id: self.id,
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate,
            effective_date: self.effective_date,
            deleted_at: self.deleted_at,
        })
    }
}
