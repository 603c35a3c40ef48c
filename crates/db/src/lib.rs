//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the staging, calculation and
//!   configuration tables
//! - Repository abstractions for data access
//! - Database migrations
//! - The `SourceLedger` extraction seam

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod source;

pub use repositories::{
    CalculationRepository, CompanyRepository, ExchangeRateRepository, MonthMapRepository,
    PriceIndexRepository, RunLogRepository, StagingRepository,
};
pub use source::{SeaOrmSourceLedger, SourceLedger, SourceLedgerError};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
