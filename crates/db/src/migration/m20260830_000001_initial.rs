//! Initial database migration.
//!
//! Creates the configuration, source-mirror, staging, calculation,
//! index and run-log tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: CONFIGURATION
        // ============================================================
        db.execute_unprepared(COMPANY_CONFIGS_SQL).await?;
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;
        db.execute_unprepared(MONTH_MAPS_SQL).await?;

        // ============================================================
        // PART 2: PRICE INDICES
        // ============================================================
        db.execute_unprepared(PRICE_INDICES_SQL).await?;

        // ============================================================
        // PART 3: SOURCE MIRROR & STAGING
        // ============================================================
        db.execute_unprepared(SOURCE_ASSETS_SQL).await?;
        db.execute_unprepared(STAGING_ASSETS_SQL).await?;

        // ============================================================
        // PART 4: CALCULATION OUTPUT
        // ============================================================
        db.execute_unprepared(CALCULATION_RESULTS_SQL).await?;
        db.execute_unprepared(SIMULATED_CALCULATIONS_SQL).await?;

        // ============================================================
        // PART 5: RUN LOG
        // ============================================================
        db.execute_unprepared(RUN_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const COMPANY_CONFIGS_SQL: &str = r"
CREATE TABLE company_configs (
    company_id INTEGER PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    source_url TEXT NOT NULL,
    custom_query TEXT,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    fiscal_year INTEGER PRIMARY KEY,
    effective_date DATE NOT NULL,
    rate NUMERIC(18, 6) NOT NULL CHECK (rate > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const MONTH_MAPS_SQL: &str = r"
CREATE TABLE inpc_disposal_months (
    month INTEGER PRIMARY KEY CHECK (month BETWEEN 1 AND 12),
    index_month INTEGER NOT NULL CHECK (index_month BETWEEN 1 AND 12)
);

CREATE TABLE inpc_fiscal_months (
    month INTEGER PRIMARY KEY CHECK (month BETWEEN 1 AND 12),
    index_month INTEGER NOT NULL CHECK (index_month BETWEEN 1 AND 12)
);
";

const PRICE_INDICES_SQL: &str = r"
CREATE TABLE price_indices (
    id UUID PRIMARY KEY,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    country_id INTEGER NOT NULL,
    simulation_group INTEGER,
    value NUMERIC(18, 6) NOT NULL,
    published_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- One value per (year, month, country) within a simulation group; the
-- published series uses a NULL group.
CREATE UNIQUE INDEX uq_price_indices_key
    ON price_indices (year, month, country_id, COALESCE(simulation_group, -1));
";

const SOURCE_ASSETS_SQL: &str = r"
CREATE TABLE source_assets (
    id BIGSERIAL PRIMARY KEY,
    company_id INTEGER NOT NULL,
    asset_number BIGINT NOT NULL,
    asset_tag VARCHAR(64),
    asset_type_id INTEGER NOT NULL,
    asset_subtype_id INTEGER,
    asset_type_name VARCHAR(255),
    description TEXT,
    currency_id INTEGER,
    currency_name VARCHAR(64),
    country_id INTEGER NOT NULL,
    country_name VARCHAR(64),
    acquired_on DATE,
    disposed_on DATE,
    status VARCHAR(16) NOT NULL,
    owned BOOLEAN NOT NULL DEFAULT TRUE,
    fiscal_basis BOOLEAN NOT NULL DEFAULT FALSE,
    reexpressed_basis BOOLEAN NOT NULL DEFAULT FALSE,
    acquisition_cost NUMERIC(18, 2),
    revalued_cost NUMERIC(18, 2),
    reexpressed_cost NUMERIC(18, 2),
    annual_rate NUMERIC(8, 4),
    prior_accumulated_depreciation NUMERIC(18, 2)
);

CREATE INDEX idx_source_assets_company ON source_assets (company_id, asset_number);
";

const STAGING_ASSETS_SQL: &str = r"
CREATE TABLE staging_assets (
    id UUID PRIMARY KEY,
    company_id INTEGER NOT NULL,
    fiscal_year INTEGER NOT NULL,
    run_id UUID NOT NULL,
    asset_number BIGINT NOT NULL,
    asset_tag VARCHAR(64),
    asset_type_id INTEGER NOT NULL,
    asset_subtype_id INTEGER,
    asset_type_name VARCHAR(255),
    description TEXT,
    currency_id INTEGER,
    currency_name VARCHAR(64),
    country_id INTEGER NOT NULL,
    country_name VARCHAR(64),
    acquired_on DATE,
    disposed_on DATE,
    status VARCHAR(16) NOT NULL,
    owned BOOLEAN NOT NULL DEFAULT TRUE,
    fiscal_basis BOOLEAN NOT NULL DEFAULT FALSE,
    reexpressed_basis BOOLEAN NOT NULL DEFAULT FALSE,
    cost_source_currency NUMERIC(18, 2),
    cost_local NUMERIC(18, 2),
    annual_rate NUMERIC(8, 4),
    monthly_rate NUMERIC(12, 8),
    prior_accumulated_depreciation NUMERIC(18, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- The costing flags are mutually exclusive once a row is staged.
    CONSTRAINT chk_staging_cost_basis CHECK (NOT (fiscal_basis AND reexpressed_basis))
);

CREATE INDEX idx_staging_assets_scope ON staging_assets (company_id, fiscal_year);
CREATE INDEX idx_staging_assets_run ON staging_assets (run_id);
";

const CALCULATION_RESULTS_SQL: &str = r"
CREATE TABLE calculation_results (
    id UUID PRIMARY KEY,
    run_id UUID NOT NULL,
    company_id INTEGER NOT NULL,
    fiscal_year INTEGER NOT NULL,
    asset_number BIGINT NOT NULL,
    selected_month INTEGER NOT NULL CHECK (selected_month BETWEEN 1 AND 12),
    acquisition_index NUMERIC(18, 6) NOT NULL,
    selected_index NUMERIC(18, 6) NOT NULL,
    update_factor NUMERIC(12, 4) NOT NULL,
    restated_balance NUMERIC(18, 2) NOT NULL,
    restated_depreciation NUMERIC(18, 2) NOT NULL,
    half_depreciation NUMERIC(18, 2) NOT NULL,
    average_value NUMERIC(18, 2) NOT NULL,
    proportional_value NUMERIC(18, 2) NOT NULL,
    floor_test_value NUMERIC(18, 2) NOT NULL,
    reportable_value NUMERIC(18, 2) NOT NULL,
    floor_test_applied BOOLEAN NOT NULL,
    months_of_use INTEGER NOT NULL CHECK (months_of_use BETWEEN 0 AND 12),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_calculation_results_scope ON calculation_results (company_id, fiscal_year);
CREATE INDEX idx_calculation_results_run ON calculation_results (run_id);
";

const SIMULATED_CALCULATIONS_SQL: &str = r"
CREATE TABLE simulated_calculations (
    id UUID PRIMARY KEY,
    company_id INTEGER NOT NULL,
    fiscal_year INTEGER NOT NULL,
    simulation_group INTEGER NOT NULL,
    asset_number BIGINT NOT NULL,
    reportable_value NUMERIC(18, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_simulated_calculations_scope
    ON simulated_calculations (company_id, fiscal_year);
";

const RUN_LOGS_SQL: &str = r"
CREATE TABLE run_logs (
    id UUID PRIMARY KEY,
    run_id UUID NOT NULL,
    run_type VARCHAR(16) NOT NULL,
    company_id INTEGER NOT NULL,
    fiscal_year INTEGER NOT NULL,
    started_at TIMESTAMPTZ NOT NULL,
    finished_at TIMESTAMPTZ,
    duration_secs BIGINT,
    processed BIGINT NOT NULL DEFAULT 0,
    succeeded BIGINT NOT NULL DEFAULT 0,
    failed BIGINT NOT NULL DEFAULT 0,
    state VARCHAR(32) NOT NULL,
    error_message TEXT,

    CONSTRAINT uq_run_logs_run_type UNIQUE (run_id, run_type)
);

CREATE INDEX idx_run_logs_scope ON run_logs (company_id, fiscal_year, started_at DESC);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS run_logs;
DROP TABLE IF EXISTS simulated_calculations;
DROP TABLE IF EXISTS calculation_results;
DROP TABLE IF EXISTS staging_assets;
DROP TABLE IF EXISTS source_assets;
DROP TABLE IF EXISTS price_indices;
DROP TABLE IF EXISTS inpc_fiscal_months;
DROP TABLE IF EXISTS inpc_disposal_months;
DROP TABLE IF EXISTS exchange_rates;
DROP TABLE IF EXISTS company_configs;
";
