//! Period-end exchange rate repository.
//!
//! One rate per fiscal year, effective June 30. Reexpressed-basis costs
//! are converted with this single rate for the whole run; a missing
//! rate aborts the run before any row is staged.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use crate::entities::exchange_rates;

/// Error types for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateError {
    /// Rate must be positive.
    #[error("exchange rate must be positive, got {0}")]
    NonPositiveRate(Decimal),

    /// No rate stored for the fiscal year.
    #[error("no period-end exchange rate stored for fiscal year {0}")]
    RateNotFound(i32),

    /// Fiscal year outside the representable date range.
    #[error("fiscal year {0} is out of range")]
    YearOutOfRange(i32),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Period-end date convention: June 30 of the fiscal year.
///
/// Returns `None` for years outside the representable calendar range.
#[must_use]
pub fn period_end_date(fiscal_year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(fiscal_year, 6, 30)
}

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the period-end rate for the fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `RateNotFound` when no rate is stored for the year.
    pub async fn period_end_rate(&self, fiscal_year: i32) -> Result<Decimal, ExchangeRateError> {
        let rate = exchange_rates::Entity::find_by_id(fiscal_year)
            .one(&self.db)
            .await?
            .ok_or(ExchangeRateError::RateNotFound(fiscal_year))?;
        Ok(rate.rate)
    }

    /// Creates or replaces the period-end rate for a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns an error when the rate is not positive or the year is
    /// out of the calendar range.
    pub async fn upsert(
        &self,
        fiscal_year: i32,
        rate: Decimal,
    ) -> Result<exchange_rates::Model, ExchangeRateError> {
        if rate <= Decimal::ZERO {
            return Err(ExchangeRateError::NonPositiveRate(rate));
        }
        let effective_date =
            period_end_date(fiscal_year).ok_or(ExchangeRateError::YearOutOfRange(fiscal_year))?;

        let existing = exchange_rates::Entity::find_by_id(fiscal_year)
            .one(&self.db)
            .await?;

        if let Some(existing_rate) = existing {
            let mut active: exchange_rates::ActiveModel = existing_rate.into();
            active.rate = Set(rate);
            active.effective_date = Set(effective_date);
            Ok(active.update(&self.db).await?)
        } else {
            let model = exchange_rates::ActiveModel {
                fiscal_year: Set(fiscal_year),
                effective_date: Set(effective_date),
                rate: Set(rate),
                created_at: Set(chrono::Utc::now().into()),
            };
            Ok(model.insert(&self.db).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_end_is_june_30() {
        let date = period_end_date(2024).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn test_period_end_out_of_range_year() {
        assert!(period_end_date(i32::MAX).is_none());
    }
}
