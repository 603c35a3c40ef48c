//! Staging repository.
//!
//! Purge and batch-insert of staged asset rows. Purge covers the
//! staging, calculation and simulated-calculation tables for one
//! (company, fiscal year) so a rerun always starts from a clean slate.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use safeharbor_core::staging::{AssetStatus, StagedAsset};
use safeharbor_shared::types::RunId;

use crate::entities::{calculation_results, simulated_calculations, staging_assets};

/// Error types for staging operations.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// A stored row carries a status string outside the known set.
    #[error("unknown asset status '{0}' in staging row")]
    UnknownStatus(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Rows removed by one purge, per table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurgeCounts {
    /// Staged asset rows removed.
    pub staging: u64,
    /// Calculation result rows removed.
    pub calculations: u64,
    /// Simulated calculation rows removed.
    pub simulations: u64,
}

/// Serializes an asset status for storage.
#[must_use]
pub const fn status_str(status: AssetStatus) -> &'static str {
    match status {
        AssetStatus::Active => "active",
        AssetStatus::Disposed => "disposed",
    }
}

/// Parses a stored asset status.
#[must_use]
pub fn parse_status(value: &str) -> Option<AssetStatus> {
    match value {
        "active" => Some(AssetStatus::Active),
        "disposed" => Some(AssetStatus::Disposed),
        _ => None,
    }
}

/// Staging repository.
#[derive(Debug, Clone)]
pub struct StagingRepository {
    db: DatabaseConnection,
}

impl StagingRepository {
    /// Creates a new staging repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Removes all staged, calculated and simulated rows for a
    /// (company, fiscal year) in one transaction.
    pub async fn purge(
        &self,
        company_id: i32,
        fiscal_year: i32,
    ) -> Result<PurgeCounts, StagingError> {
        let txn = self.db.begin().await?;

        let calculations = calculation_results::Entity::delete_many()
            .filter(calculation_results::Column::CompanyId.eq(company_id))
            .filter(calculation_results::Column::FiscalYear.eq(fiscal_year))
            .exec(&txn)
            .await?
            .rows_affected;

        let simulations = simulated_calculations::Entity::delete_many()
            .filter(simulated_calculations::Column::CompanyId.eq(company_id))
            .filter(simulated_calculations::Column::FiscalYear.eq(fiscal_year))
            .exec(&txn)
            .await?
            .rows_affected;

        let staging = staging_assets::Entity::delete_many()
            .filter(staging_assets::Column::CompanyId.eq(company_id))
            .filter(staging_assets::Column::FiscalYear.eq(fiscal_year))
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        Ok(PurgeCounts {
            staging,
            calculations,
            simulations,
        })
    }

    /// Inserts one batch of staged rows in a single transaction.
    ///
    /// A failed insert rolls back the whole batch; the caller fails the
    /// run rather than retrying a half-written batch.
    pub async fn insert_batch(&self, rows: &[StagedAsset]) -> Result<(), StagingError> {
        if rows.is_empty() {
            return Ok(());
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let models = rows.iter().map(|row| staging_assets::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(row.company_id),
            fiscal_year: Set(row.fiscal_year),
            run_id: Set(row.run_id.into_inner()),
            asset_number: Set(row.asset_number),
            asset_tag: Set(row.asset_tag.clone()),
            asset_type_id: Set(row.asset_type_id),
            asset_subtype_id: Set(row.asset_subtype_id),
            asset_type_name: Set(row.asset_type_name.clone()),
            description: Set(row.description.clone()),
            currency_id: Set(row.currency_id),
            currency_name: Set(row.currency_name.clone()),
            country_id: Set(row.country_id),
            country_name: Set(row.country_name.clone()),
            acquired_on: Set(row.acquired_on),
            disposed_on: Set(row.disposed_on),
            status: Set(status_str(row.status).to_string()),
            owned: Set(row.owned),
            fiscal_basis: Set(row.fiscal_basis),
            reexpressed_basis: Set(row.reexpressed_basis),
            cost_source_currency: Set(row.cost_source_currency),
            cost_local: Set(row.cost_local),
            annual_rate: Set(row.annual_rate),
            monthly_rate: Set(row.monthly_rate),
            prior_accumulated_depreciation: Set(row.prior_accumulated_depreciation),
            created_at: Set(now),
        });

        let txn = self.db.begin().await?;
        staging_assets::Entity::insert_many(models).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Counts staged rows for a (company, fiscal year).
    pub async fn count_for(&self, company_id: i32, fiscal_year: i32) -> Result<u64, StagingError> {
        Ok(staging_assets::Entity::find()
            .filter(staging_assets::Column::CompanyId.eq(company_id))
            .filter(staging_assets::Column::FiscalYear.eq(fiscal_year))
            .count(&self.db)
            .await?)
    }

    /// Loads the staged rows of a (company, fiscal year) for the
    /// calculation stage, in stable asset order.
    pub async fn list_for(
        &self,
        company_id: i32,
        fiscal_year: i32,
    ) -> Result<Vec<StagedAsset>, StagingError> {
        let rows = staging_assets::Entity::find()
            .filter(staging_assets::Column::CompanyId.eq(company_id))
            .filter(staging_assets::Column::FiscalYear.eq(fiscal_year))
            .order_by_asc(staging_assets::Column::AssetNumber)
            .all(&self.db)
            .await?;

        rows.into_iter().map(to_staged).collect()
    }
}

fn to_staged(model: staging_assets::Model) -> Result<StagedAsset, StagingError> {
    let status =
        parse_status(&model.status).ok_or_else(|| StagingError::UnknownStatus(model.status.clone()))?;

    Ok(StagedAsset {
        company_id: model.company_id,
        fiscal_year: model.fiscal_year,
        run_id: RunId::from_uuid(model.run_id),
        asset_number: model.asset_number,
        asset_tag: model.asset_tag,
        asset_type_id: model.asset_type_id,
        asset_subtype_id: model.asset_subtype_id,
        asset_type_name: model.asset_type_name,
        description: model.description,
        currency_id: model.currency_id,
        currency_name: model.currency_name,
        country_id: model.country_id,
        country_name: model.country_name,
        acquired_on: model.acquired_on,
        disposed_on: model.disposed_on,
        status,
        owned: model.owned,
        fiscal_basis: model.fiscal_basis,
        reexpressed_basis: model.reexpressed_basis,
        cost_source_currency: model.cost_source_currency,
        cost_local: model.cost_local,
        annual_rate: model.annual_rate,
        monthly_rate: model.monthly_rate,
        prior_accumulated_depreciation: model.prior_accumulated_depreciation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [AssetStatus::Active, AssetStatus::Disposed] {
            assert_eq!(parse_status(status_str(status)), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert_eq!(parse_status("Baja"), None);
        assert_eq!(parse_status(""), None);
    }
}
