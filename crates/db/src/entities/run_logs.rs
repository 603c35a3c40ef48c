//! `SeaORM` Entity for the run_logs table.
//!
//! Durable per-run log, one row per (run id, run type). The merge-style
//! upsert in the repository guarantees retried starts never duplicate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "run_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub run_id: Uuid,
    pub run_type: String,
    pub company_id: i32,
    pub fiscal_year: i32,
    pub started_at: DateTimeWithTimeZone,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub duration_secs: Option<i64>,
    pub processed: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub state: String,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
