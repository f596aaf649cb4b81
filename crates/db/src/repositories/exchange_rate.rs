//! Exchange rate repository.
//!
//! Storage only; resolution (direct, inverse, hub triangulation) is done by
//! [`RateResolver`] over the full table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::currency::{CurrencyError, ExchangeRate, RateResolver, ResolvedRate};
use tally_shared::types::{CurrencyCode, CurrencyCodeError, ExchangeRateId};
use tracing::info;
use uuid::Uuid;

use crate::entities::{currencies, exchange_rates};
use crate::mapping::rate_from_model;

/// Error types for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateError {
    /// Rate must be positive.
    #[error("Exchange rate must be positive")]
    NonPositiveRate,

    /// Currencies must be different.
    #[error("From and to currencies must be different")]
    SameCurrency,

    /// Currency not found.
    #[error("Currency '{0}' not found")]
    CurrencyNotFound(String),

    /// Exchange rate row not found.
    #[error("Exchange rate not found: {0}")]
    NotFound(Uuid),

    /// No rate path between the currencies.
    #[error(transparent)]
    Resolution(#[from] CurrencyError),

    /// A stored row failed to decode.
    #[error("Corrupt exchange rate row: {0}")]
    CorruptRow(#[from] CurrencyCodeError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or updating an exchange rate.
#[derive(Debug, Clone)]
pub struct CreateExchangeRateInput {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Effective date for this rate.
    pub effective_date: NaiveDate,
}

/// Exchange rate repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
    resolver: RateResolver,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository with the default hubs.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            resolver: RateResolver::default(),
        }
    }

    /// Replaces the resolver used by [`Self::resolve_rate`].
    #[must_use]
    pub fn with_resolver(mut self, resolver: RateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Creates or updates the live rate for a pair and date.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Rate is not positive
    /// - From and to currencies are the same
    /// - Either currency does not exist
    pub async fn upsert_rate(
        &self,
        input: CreateExchangeRateInput,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        if input.rate <= Decimal::ZERO {
            return Err(ExchangeRateError::NonPositiveRate);
        }
        if input.from_currency == input.to_currency {
            return Err(ExchangeRateError::SameCurrency);
        }
        for code in [&input.from_currency, &input.to_currency] {
            let found = currencies::Entity::find_by_id(code.as_str().to_string())
                .one(&self.db)
                .await?;
            if found.is_none() {
                return Err(ExchangeRateError::CurrencyNotFound(code.to_string()));
            }
        }

        let existing = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::FromCurrency.eq(input.from_currency.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(input.to_currency.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.eq(input.effective_date))
            .filter(exchange_rates::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        let model = if let Some(existing) = existing {
            let mut active: exchange_rates::ActiveModel = existing.into();
            active.rate = Set(input.rate);
            active.update(&self.db).await?
        } else {
            exchange_rates::ActiveModel {
                id: Set(ExchangeRateId::new().into_inner()),
                from_currency: Set(input.from_currency.to_string()),
                to_currency: Set(input.to_currency.to_string()),
                rate: Set(input.rate),
                effective_date: Set(input.effective_date),
                created_at: Set(chrono::Utc::now().into()),
                deleted_at: Set(None),
            }
            .insert(&self.db)
            .await?
        };

        let rate = rate_from_model(model)?;
        info!(
            from = %rate.from_currency,
            to = %rate.to_currency,
            rate = %rate.rate,
            effective_date = %rate.effective_date,
            "Exchange rate stored"
        );
        Ok(rate)
    }

    /// Soft-deletes a rate so it no longer takes part in resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if no live rate has that ID.
    pub async fn delete_rate(&self, id: ExchangeRateId) -> Result<(), ExchangeRateError> {
        let uuid = id.into_inner();
        let rate = exchange_rates::Entity::find_by_id(uuid)
            .filter(exchange_rates::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(ExchangeRateError::NotFound(uuid))?;

        let mut active: exchange_rates::ActiveModel = rate.into();
        active.deleted_at = Set(Some(chrono::Utc::now().into()));
        active.update(&self.db).await?;

        info!(rate_id = %id, "Exchange rate deleted");
        Ok(())
    }

    /// Lists live rates, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_rates(&self) -> Result<Vec<ExchangeRate>, ExchangeRateError> {
        let rates = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::DeletedAt.is_null())
            .order_by_asc(exchange_rates::Column::FromCurrency)
            .order_by_asc(exchange_rates::Column::ToCurrency)
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(rate_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rates)
    }

    /// Resolves the factor converting one unit of `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path exists or the query fails.
    pub async fn resolve_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ResolvedRate, ExchangeRateError> {
        let rates = self.list_rates().await?;
        Ok(self.resolver.resolve(from, to, &rates)?)
    }
}
