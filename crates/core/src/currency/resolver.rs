//! Exchange rate resolution over a rate table.
//!
//! Lookup priority:
//! 1. Same currency (rate of 1)
//! 2. Direct rate (from -> to)
//! 3. Inverse rate (to -> from, then invert)
//! 4. Triangulation through one hub currency, hubs tried in configured order
//!
//! Triangulation legs only use steps 2 and 3, so a path has at most one hub.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::CurrencyCode;
use thiserror::Error;
use tracing::debug;

use super::conversion::convert_minor_units;
use super::exchange::ExchangeRate;

/// Errors raised while resolving or applying an exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// No direct, inverse, or single-hub path exists.
    #[error("No exchange rate found for {from}/{to}")]
    RateNotFound {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
    },

    /// The converted amount does not fit in a minor-unit integer.
    #[error("Converting {amount} at rate {rate} overflows")]
    Overflow {
        /// Source amount in minor units.
        amount: i64,
        /// Applied rate.
        rate: Decimal,
    },
}

/// How an exchange rate was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLookupMethod {
    /// Source and target are the same currency.
    Identity,
    /// Direct rate found (from -> to).
    Direct,
    /// Inverse rate calculated (to -> from, then inverted).
    Inverse,
    /// Derived through an intermediate currency.
    Triangulated {
        /// The hub currency used.
        via: CurrencyCode,
    },
}

/// Result of a rate lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRate {
    /// The exchange rate (1 from = rate to).
    pub rate: Decimal,
    /// How the rate was obtained.
    pub method: RateLookupMethod,
}

/// Resolves conversion factors from a rate table.
///
/// Holds only the ordered hub list; the rate table is passed per call so the
/// caller controls which snapshot is used.
#[derive(Debug, Clone)]
pub struct RateResolver {
    hubs: Vec<CurrencyCode>,
}

impl Default for RateResolver {
    fn default() -> Self {
        let hubs = ["USD", "EUR", "GBP", "JPY", "CHF"]
            .into_iter()
            .filter_map(|code| CurrencyCode::new(code).ok())
            .collect();
        Self { hubs }
    }
}

impl RateResolver {
    /// Creates a resolver with the given hub candidates, tried in order.
    #[must_use]
    pub fn new(hubs: Vec<CurrencyCode>) -> Self {
        Self { hubs }
    }

    /// Creates a resolver from configured hub codes, skipping invalid ones.
    #[must_use]
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        let hubs = codes
            .iter()
            .filter_map(|code| CurrencyCode::new(code.as_ref()).ok())
            .collect();
        Self { hubs }
    }

    /// Returns the hub candidates in lookup order.
    #[must_use]
    pub fn hubs(&self) -> &[CurrencyCode] {
        &self.hubs
    }

    /// Resolves the rate converting one unit of `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::RateNotFound` if no path exists.
    pub fn resolve(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        rates: &[ExchangeRate],
    ) -> Result<ResolvedRate, CurrencyError> {
        if from == to {
            return Ok(ResolvedRate {
                rate: Decimal::ONE,
                method: RateLookupMethod::Identity,
            });
        }

        let usable: Vec<&ExchangeRate> = rates.iter().filter(|r| r.is_usable()).collect();

        if let Some(resolved) = resolve_single_step(&usable, from, to) {
            debug!(%from, %to, rate = %resolved.rate, method = ?resolved.method, "Resolved exchange rate");
            return Ok(resolved);
        }

        for hub in &self.hubs {
            if hub == from || hub == to {
                continue;
            }
            let (Some(first), Some(second)) = (
                resolve_single_step(&usable, from, hub),
                resolve_single_step(&usable, hub, to),
            ) else {
                continue;
            };
            if let Some(rate) = first.rate.checked_mul(second.rate) {
                debug!(%from, %to, via = %hub, %rate, "Triangulated exchange rate");
                return Ok(ResolvedRate {
                    rate,
                    method: RateLookupMethod::Triangulated { via: hub.clone() },
                });
            }
        }

        Err(CurrencyError::RateNotFound {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Converts a minor-unit amount from one currency to another.
    ///
    /// # Errors
    ///
    /// Returns `RateNotFound` when no path exists and `Overflow` when the
    /// result does not fit.
    pub fn convert_amount(
        &self,
        amount: i64,
        from: &CurrencyCode,
        to: &CurrencyCode,
        rates: &[ExchangeRate],
    ) -> Result<i64, CurrencyError> {
        let resolved = self.resolve(from, to, rates)?;
        convert_minor_units(amount, resolved.rate).ok_or(CurrencyError::Overflow {
            amount,
            rate: resolved.rate,
        })
    }
}

/// Direct or inverse lookup; never triangulates.
fn resolve_single_step(
    rates: &[&ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Option<ResolvedRate> {
    if let Some(direct) = latest(rates, from, to) {
        return Some(ResolvedRate {
            rate: direct.rate,
            method: RateLookupMethod::Direct,
        });
    }

    let inverse = latest(rates, to, from)?;
    let rate = Decimal::ONE.checked_div(inverse.rate)?;
    Some(ResolvedRate {
        rate,
        method: RateLookupMethod::Inverse,
    })
}

/// Picks the most recently effective row for a pair; later ids win ties.
fn latest<'a>(
    rates: &[&'a ExchangeRate],
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Option<&'a ExchangeRate> {
    rates
        .iter()
        .copied()
        .filter(|r| r.converts(from, to))
        .max_by_key(|r| (r.effective_date, r.id))
}
