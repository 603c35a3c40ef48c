//! `SeaORM` entity definitions.

pub mod calculation_results;
pub mod company_configs;
pub mod exchange_rates;
pub mod inpc_disposal_months;
pub mod inpc_fiscal_months;
pub mod price_indices;
pub mod run_logs;
pub mod simulated_calculations;
pub mod source_assets;
pub mod staging_assets;
