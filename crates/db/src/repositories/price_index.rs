//! Price-index repository.
//!
//! Point lookup by (year, month, country, simulation group) with
//! NULL-group fallback, and bulk refresh as delete-then-reinsert scoped
//! to a simulation group. Published values (NULL group) are immutable
//! for a key once written; refresh replaces whole scopes, never single
//! cells.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::price_indices;

/// Error types for price-index operations.
#[derive(Debug, thiserror::Error)]
pub enum PriceIndexError {
    /// No index value stored for the key, in the requested group or the
    /// published series.
    #[error("no index value for year {year}, month {month}, country {country_id}")]
    IndexNotFound {
        /// Calendar year.
        year: i32,
        /// Calendar month 1-12.
        month: i32,
        /// Country id.
        country_id: i32,
    },

    /// Month outside 1-12.
    #[error("month must be within 1-12, got {0}")]
    MonthOutOfRange(i32),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// One index value for bulk refresh.
#[derive(Debug, Clone)]
pub struct NewPriceIndex {
    /// Calendar year.
    pub year: i32,
    /// Calendar month 1-12.
    pub month: i32,
    /// Country id.
    pub country_id: i32,
    /// Index value.
    pub value: Decimal,
}

/// Counts of stored index values.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct PriceIndexStats {
    /// Values in the published series (NULL group).
    pub published: u64,
    /// Values in simulation groups.
    pub simulated: u64,
}

/// Price-index repository.
#[derive(Debug, Clone)]
pub struct PriceIndexRepository {
    db: DatabaseConnection,
}

impl PriceIndexRepository {
    /// Creates a new price-index repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Looks up one index value.
    ///
    /// When a simulation group is given, the group value wins; a missing
    /// group value falls back to the published series before erroring.
    ///
    /// # Errors
    ///
    /// Returns `IndexNotFound` when neither the group nor the published
    /// series holds the key.
    pub async fn find_value(
        &self,
        year: i32,
        month: i32,
        country_id: i32,
        simulation_group: Option<i32>,
    ) -> Result<Decimal, PriceIndexError> {
        if !(1..=12).contains(&month) {
            return Err(PriceIndexError::MonthOutOfRange(month));
        }

        if let Some(group) = simulation_group {
            if let Some(row) = self.find_in_group(year, month, country_id, Some(group)).await? {
                return Ok(row.value);
            }
        }

        self.find_in_group(year, month, country_id, None)
            .await?
            .map(|row| row.value)
            .ok_or(PriceIndexError::IndexNotFound {
                year,
                month,
                country_id,
            })
    }

    async fn find_in_group(
        &self,
        year: i32,
        month: i32,
        country_id: i32,
        simulation_group: Option<i32>,
    ) -> Result<Option<price_indices::Model>, PriceIndexError> {
        let mut query = price_indices::Entity::find()
            .filter(price_indices::Column::Year.eq(year))
            .filter(price_indices::Column::Month.eq(month))
            .filter(price_indices::Column::CountryId.eq(country_id));

        query = match simulation_group {
            Some(group) => query.filter(price_indices::Column::SimulationGroup.eq(group)),
            None => query.filter(price_indices::Column::SimulationGroup.is_null()),
        };

        Ok(query.one(&self.db).await?)
    }

    /// Replaces the stored values of one scope.
    ///
    /// When a simulation group is given, only that group's rows for the
    /// country are deleted and reinserted; otherwise the country's
    /// published series is replaced whole. Delete and reinsert run in
    /// one transaction, so a failed refresh leaves the old values
    /// intact.
    ///
    /// # Errors
    ///
    /// Returns `MonthOutOfRange` when an input row is invalid, before
    /// anything is deleted.
    pub async fn refresh(
        &self,
        country_id: i32,
        simulation_group: Option<i32>,
        values: Vec<NewPriceIndex>,
    ) -> Result<u64, PriceIndexError> {
        for value in &values {
            if !(1..=12).contains(&value.month) {
                return Err(PriceIndexError::MonthOutOfRange(value.month));
            }
        }

        let txn = self.db.begin().await?;

        let mut delete = price_indices::Entity::delete_many()
            .filter(price_indices::Column::CountryId.eq(country_id));
        delete = match simulation_group {
            Some(group) => delete.filter(price_indices::Column::SimulationGroup.eq(group)),
            None => delete.filter(price_indices::Column::SimulationGroup.is_null()),
        };
        delete.exec(&txn).await?;

        let inserted = u64::try_from(values.len()).unwrap_or(u64::MAX);
        if !values.is_empty() {
            let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
            let models = values.into_iter().map(|value| price_indices::ActiveModel {
                id: Set(Uuid::new_v4()),
                year: Set(value.year),
                month: Set(value.month),
                country_id: Set(country_id),
                simulation_group: Set(simulation_group),
                value: Set(value.value),
                published_at: Set(now),
            });
            price_indices::Entity::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(inserted)
    }

    /// Counts stored values by series.
    pub async fn stats(&self) -> Result<PriceIndexStats, PriceIndexError> {
        let published = price_indices::Entity::find()
            .filter(price_indices::Column::SimulationGroup.is_null())
            .count(&self.db)
            .await?;
        let simulated = price_indices::Entity::find()
            .filter(price_indices::Column::SimulationGroup.is_not_null())
            .count(&self.db)
            .await?;
        Ok(PriceIndexStats {
            published,
            simulated,
        })
    }
}
