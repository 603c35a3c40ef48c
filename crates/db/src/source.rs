//! Source ledger extraction seam.
//!
//! The staging pipeline pulls candidate rows through the `SourceLedger`
//! trait instead of querying a concrete store, so tests drive the
//! pipeline with an in-memory ledger. The shipped implementation reads
//! the mirrored `source_assets` table.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use safeharbor_core::staging::{is_candidate, AssetStatus, SourceAssetRow};

use crate::entities::source_assets;
use crate::repositories::staging::parse_status;

/// Error types for source ledger extraction.
#[derive(Debug, thiserror::Error)]
pub enum SourceLedgerError {
    /// A source row carries a status string outside the known set.
    #[error("unknown asset status '{0}' in source row for asset {1}")]
    UnknownStatus(String, i64),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Extraction interface over the upstream fixed-asset ledger.
#[async_trait]
pub trait SourceLedger: Send + Sync {
    /// Fetches the candidate rows of one company for one fiscal year,
    /// already filtered by the extraction predicate, capped at `limit`
    /// rows when given (test mode).
    async fn fetch_candidates(
        &self,
        company_id: i32,
        fiscal_year: i32,
        limit: Option<usize>,
    ) -> Result<Vec<SourceAssetRow>, SourceLedgerError>;
}

/// `SeaORM`-backed source ledger reading the `source_assets` mirror.
#[derive(Debug, Clone)]
pub struct SeaOrmSourceLedger {
    db: DatabaseConnection,
}

impl SeaOrmSourceLedger {
    /// Creates a new ledger over the given connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SourceLedger for SeaOrmSourceLedger {
    async fn fetch_candidates(
        &self,
        company_id: i32,
        fiscal_year: i32,
        limit: Option<usize>,
    ) -> Result<Vec<SourceAssetRow>, SourceLedgerError> {
        let models = source_assets::Entity::find()
            .filter(source_assets::Column::CompanyId.eq(company_id))
            .order_by_asc(source_assets::Column::AssetNumber)
            .all(&self.db)
            .await?;

        let mut rows = Vec::new();
        for model in models {
            let row = to_source_row(model)?;
            if !is_candidate(&row, fiscal_year) {
                continue;
            }
            rows.push(row);
            if limit.is_some_and(|cap| rows.len() >= cap) {
                break;
            }
        }
        Ok(rows)
    }
}

fn to_source_row(model: source_assets::Model) -> Result<SourceAssetRow, SourceLedgerError> {
    let status: AssetStatus = parse_status(&model.status)
        .ok_or_else(|| SourceLedgerError::UnknownStatus(model.status.clone(), model.asset_number))?;

    Ok(SourceAssetRow {
        company_id: model.company_id,
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
        acquisition_cost: model.acquisition_cost,
        revalued_cost: model.revalued_cost,
        reexpressed_cost: model.reexpressed_cost,
        annual_rate: model.annual_rate,
        prior_accumulated_depreciation: model.prior_accumulated_depreciation,
    })
}
