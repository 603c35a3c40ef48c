//! Calculation result repository.
//!
//! Batch insert of restated figures and aggregate totals per run.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use safeharbor_core::indexation::IndexationResult;
use safeharbor_shared::types::RunId;

use crate::entities::calculation_results;

/// Error types for calculation result operations.
#[derive(Debug, thiserror::Error)]
pub enum CalculationError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// One calculation result row to persist.
#[derive(Debug, Clone)]
pub struct NewCalculationResult {
    /// Calculation run id.
    pub run_id: RunId,
    /// Company owning the asset.
    pub company_id: i32,
    /// Fiscal year under calculation.
    pub fiscal_year: i32,
    /// Numeric asset identifier.
    pub asset_number: i64,
    /// Index month selected by the engine (1-12).
    pub selected_month: i32,
    /// Acquisition-month index value.
    pub acquisition_index: Decimal,
    /// Selected-month index value.
    pub selected_index: Decimal,
    /// Months of use in the period (0-12).
    pub months_of_use: i32,
    /// Restated figures from the calculator.
    pub result: IndexationResult,
}

/// Aggregate totals for one calculation run.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RunTotals {
    /// Result rows written.
    pub records: u64,
    /// Sum of reportable values.
    pub total_reportable_value: Decimal,
    /// Rows where the 10% floor won.
    pub floor_test_count: u64,
}

/// Calculation result repository.
#[derive(Debug, Clone)]
pub struct CalculationRepository {
    db: DatabaseConnection,
}

impl CalculationRepository {
    /// Creates a new calculation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts one batch of result rows in a single transaction.
    pub async fn insert_batch(
        &self,
        rows: &[NewCalculationResult],
    ) -> Result<(), CalculationError> {
        if rows.is_empty() {
            return Ok(());
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let models = rows.iter().map(|row| calculation_results::ActiveModel {
            id: Set(Uuid::new_v4()),
            run_id: Set(row.run_id.into_inner()),
            company_id: Set(row.company_id),
            fiscal_year: Set(row.fiscal_year),
            asset_number: Set(row.asset_number),
            selected_month: Set(row.selected_month),
            acquisition_index: Set(row.acquisition_index),
            selected_index: Set(row.selected_index),
            update_factor: Set(row.result.update_factor),
            restated_balance: Set(row.result.restated_balance),
            restated_depreciation: Set(row.result.restated_depreciation),
            half_depreciation: Set(row.result.half_depreciation),
            average_value: Set(row.result.average_value),
            proportional_value: Set(row.result.proportional_value),
            floor_test_value: Set(row.result.floor_test_value),
            reportable_value: Set(row.result.reportable_value),
            floor_test_applied: Set(row.result.floor_test_applied),
            months_of_use: Set(row.months_of_use),
            created_at: Set(now),
        });

        let txn = self.db.begin().await?;
        calculation_results::Entity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Computes the aggregate totals of one run.
    pub async fn totals_for_run(&self, run_id: RunId) -> Result<RunTotals, CalculationError> {
        let rows = calculation_results::Entity::find()
            .filter(calculation_results::Column::RunId.eq(run_id.into_inner()))
            .all(&self.db)
            .await?;

        let records = u64::try_from(rows.len()).unwrap_or(u64::MAX);
        let total_reportable_value = rows.iter().map(|r| r.reportable_value).sum();
        let floor_test_count = u64::try_from(rows.iter().filter(|r| r.floor_test_applied).count())
            .unwrap_or(u64::MAX);

        Ok(RunTotals {
            records,
            total_reportable_value,
            floor_test_count,
        })
    }

    /// Counts result rows for a (company, fiscal year).
    pub async fn count_for(
        &self,
        company_id: i32,
        fiscal_year: i32,
    ) -> Result<u64, CalculationError> {
        Ok(calculation_results::Entity::find()
            .filter(calculation_results::Column::CompanyId.eq(company_id))
            .filter(calculation_results::Column::FiscalYear.eq(fiscal_year))
            .count(&self.db)
            .await?)
    }

    /// Lists the result rows of one run in stable asset order.
    pub async fn list_for_run(
        &self,
        run_id: RunId,
    ) -> Result<Vec<calculation_results::Model>, CalculationError> {
        Ok(calculation_results::Entity::find()
            .filter(calculation_results::Column::RunId.eq(run_id.into_inner()))
            .order_by_asc(calculation_results::Column::AssetNumber)
            .all(&self.db)
            .await?)
    }
}
