//! `SeaORM` Entity for the staging_assets table.
//!
//! Normalized asset rows produced by one staging run for one
//! (company, fiscal year) pair. Purged and reloaded on every rerun.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "staging_assets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: i32,
    pub fiscal_year: i32,
    pub run_id: Uuid,
    pub asset_number: i64,
    pub asset_tag: Option<String>,
    pub asset_type_id: i32,
    pub asset_subtype_id: Option<i32>,
    pub asset_type_name: Option<String>,
    pub description: Option<String>,
    pub currency_id: Option<i32>,
    pub currency_name: Option<String>,
    pub country_id: i32,
    pub country_name: Option<String>,
    pub acquired_on: Option<Date>,
    pub disposed_on: Option<Date>,
    pub status: String,
    pub owned: bool,
    pub fiscal_basis: bool,
    pub reexpressed_basis: bool,
    pub cost_source_currency: Option<Decimal>,
    pub cost_local: Option<Decimal>,
    pub annual_rate: Option<Decimal>,
    pub monthly_rate: Option<Decimal>,
    pub prior_accumulated_depreciation: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
