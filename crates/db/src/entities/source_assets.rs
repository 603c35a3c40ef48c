//! `SeaORM` Entity for the source_assets table.
//!
//! Mirror of the upstream fixed-asset ledger, extracted into staging by
//! the pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "source_assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i32,
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
    pub acquisition_cost: Option<Decimal>,
    pub revalued_cost: Option<Decimal>,
    pub reexpressed_cost: Option<Decimal>,
    pub annual_rate: Option<Decimal>,
    pub prior_accumulated_depreciation: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
