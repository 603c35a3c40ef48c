//! Staged asset record types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use safeharbor_shared::types::RunId;
use serde::{Deserialize, Serialize};

/// Operational status of an asset in the source ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Asset is in service.
    Active,
    /// Asset has been disposed of.
    Disposed,
}

/// A raw asset row as extracted from the source ledger.
#[derive(Debug, Clone)]
pub struct SourceAssetRow {
    /// Company owning the asset.
    pub company_id: i32,
    /// Numeric asset identifier in the source ledger.
    pub asset_number: i64,
    /// Tag/plate identifier.
    pub asset_tag: Option<String>,
    /// Asset type.
    pub asset_type_id: i32,
    /// Asset subtype.
    pub asset_subtype_id: Option<i32>,
    /// Human-readable type name.
    pub asset_type_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Currency of the source amounts.
    pub currency_id: Option<i32>,
    /// Human-readable currency name.
    pub currency_name: Option<String>,
    /// Country whose price index applies.
    pub country_id: i32,
    /// Human-readable country name.
    pub country_name: Option<String>,
    /// Acquisition date.
    pub acquired_on: Option<NaiveDate>,
    /// Disposal date, when disposed.
    pub disposed_on: Option<NaiveDate>,
    /// Operational status.
    pub status: AssetStatus,
    /// Whether the asset is company-owned.
    pub owned: bool,
    /// Fiscal-basis costing flag. Mutually exclusive with
    /// `reexpressed_basis`; both set is a data-entry error.
    pub fiscal_basis: bool,
    /// Reexpressed-basis costing flag.
    pub reexpressed_basis: bool,
    /// Raw acquisition cost (MOI).
    pub acquisition_cost: Option<Decimal>,
    /// Revalued cost (fiscal basis).
    pub revalued_cost: Option<Decimal>,
    /// Reexpressed cost (reexpressed basis, source currency).
    pub reexpressed_cost: Option<Decimal>,
    /// Annual depreciation rate in percent.
    pub annual_rate: Option<Decimal>,
    /// Accumulated depreciation at the start of the fiscal year.
    pub prior_accumulated_depreciation: Option<Decimal>,
}

/// A normalized asset row ready for the staging store.
#[derive(Debug, Clone)]
pub struct StagedAsset {
    /// Company owning the asset.
    pub company_id: i32,
    /// Fiscal year under calculation.
    pub fiscal_year: i32,
    /// Staging run that produced this row.
    pub run_id: RunId,
    /// Numeric asset identifier in the source ledger.
    pub asset_number: i64,
    /// Tag/plate identifier.
    pub asset_tag: Option<String>,
    /// Asset type.
    pub asset_type_id: i32,
    /// Asset subtype.
    pub asset_subtype_id: Option<i32>,
    /// Human-readable type name.
    pub asset_type_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Currency of the source amounts.
    pub currency_id: Option<i32>,
    /// Human-readable currency name.
    pub currency_name: Option<String>,
    /// Country whose price index applies.
    pub country_id: i32,
    /// Human-readable country name.
    pub country_name: Option<String>,
    /// Acquisition date.
    pub acquired_on: Option<NaiveDate>,
    /// Disposal date, when disposed.
    pub disposed_on: Option<NaiveDate>,
    /// Operational status.
    pub status: AssetStatus,
    /// Whether the asset is company-owned.
    pub owned: bool,
    /// Fiscal-basis costing flag (post-validation: never set together
    /// with `reexpressed_basis`).
    pub fiscal_basis: bool,
    /// Reexpressed-basis costing flag.
    pub reexpressed_basis: bool,
    /// Cost in the source currency, when the reexpressed basis applies.
    pub cost_source_currency: Option<Decimal>,
    /// Cost in local currency, input to the valuation.
    pub cost_local: Option<Decimal>,
    /// Annual depreciation rate in percent.
    pub annual_rate: Option<Decimal>,
    /// Monthly depreciation rate (`annual / 100 / 12`).
    pub monthly_rate: Option<Decimal>,
    /// Accumulated depreciation at the start of the fiscal year.
    pub prior_accumulated_depreciation: Option<Decimal>,
}
