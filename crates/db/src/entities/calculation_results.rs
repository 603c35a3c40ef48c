//! `SeaORM` Entity for the calculation_results table.
//!
//! One row per staged asset per calculation run, holding the restated
//! figures and the floor-test outcome.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "calculation_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub run_id: Uuid,
    pub company_id: i32,
    pub fiscal_year: i32,
    pub asset_number: i64,
    pub selected_month: i32,
    pub acquisition_index: Decimal,
    pub selected_index: Decimal,
    pub update_factor: Decimal,
    pub restated_balance: Decimal,
    pub restated_depreciation: Decimal,
    pub half_depreciation: Decimal,
    pub average_value: Decimal,
    pub proportional_value: Decimal,
    pub floor_test_value: Decimal,
    pub reportable_value: Decimal,
    pub floor_test_applied: bool,
    pub months_of_use: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
