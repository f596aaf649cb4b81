//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod exchange;
pub mod resolver;

#[cfg(test)]
mod props;

pub use conversion::convert_minor_units;
pub use exchange::ExchangeRate;
pub use resolver::{CurrencyError, RateLookupMethod, RateResolver, ResolvedRate};
