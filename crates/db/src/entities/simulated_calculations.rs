//! `SeaORM` Entity for the simulated_calculations table.
//!
//! What-if valuation rows computed against a simulation group of index
//! values. Purged together with staging and calculation rows so reruns
//! start from a clean slate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "simulated_calculations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: i32,
    pub fiscal_year: i32,
    pub simulation_group: i32,
    pub asset_number: i64,
    pub reportable_value: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
