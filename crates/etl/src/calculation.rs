//! Safe Harbor calculation stage.
//!
//! Applies month selection and indexation to every staged row of a
//! (company, fiscal year), writing one calculation result per asset.
//! The stage is invoked through the `CalculationStage` trait with a
//! structured request/response; the orchestrator never scrapes console
//! text for outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use safeharbor_core::indexation::{restate, select_index_month, IndexationInput, MonthSelectionError};
use safeharbor_core::progress::ProgressTracker;
use safeharbor_core::staging::StagedAsset;
use safeharbor_db::repositories::{
    CalculationError, CalculationRepository, MonthMapError, MonthMapRepository,
    NewCalculationResult, PriceIndexError, PriceIndexRepository, RunLogError, RunLogRepository,
    StagingError, StagingRepository, StartRunInput,
};
use safeharbor_shared::config::EtlConfig;
use safeharbor_shared::types::{RunId, RunState, RunType};

use chrono::Datelike;

use crate::pipeline::terminal_counts;

/// Errors that fail a calculation run.
#[derive(Debug, thiserror::Error)]
pub enum CalculationStageError {
    /// Month-mapping tables missing or invalid.
    #[error(transparent)]
    MonthMap(#[from] MonthMapError),

    /// The disposal month map lacks a required entry. A hard error:
    /// valuing a disposed asset with the wrong month silently misstates
    /// the filing.
    #[error("no index month mapped for disposal-preceding month {0}")]
    DisposalMonthUnmapped(u32),

    /// Staging store read failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// Result write failed.
    #[error(transparent)]
    Results(#[from] CalculationError),

    /// Durable log operation failed.
    #[error(transparent)]
    RunLog(#[from] RunLogError),

    /// Price index lookup failed with a non-lookup error.
    #[error(transparent)]
    PriceIndex(#[from] PriceIndexError),

    /// External calculation stage failed.
    #[error("{0}")]
    Stage(String),
}

/// Parameters of one calculation run.
#[derive(Debug, Clone, Copy)]
pub struct CalculationRequest {
    /// Company to calculate.
    pub company_id: i32,
    /// Fiscal year to calculate.
    pub fiscal_year: i32,
    /// Staging run whose rows feed this calculation.
    pub staging_run_id: RunId,
}

/// Result of a completed calculation run.
#[derive(Debug, Clone, Copy)]
pub struct CalculationOutcome {
    /// Calculation run id.
    pub run_id: RunId,
    /// Result rows written.
    pub records: u64,
    /// Rows dropped by row-level validation.
    pub skipped: u64,
    /// Sum of reportable values.
    pub total_reportable_value: Decimal,
    /// Rows where the 10% floor won.
    pub floor_test_count: u64,
}

/// Calculation seam between the orchestrator and a valuation engine.
#[async_trait]
pub trait CalculationStage: Send + Sync {
    /// Runs the valuation for one staged (company, fiscal year).
    async fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculationOutcome, CalculationStageError>;
}

/// Months of use of an asset within the fiscal year.
///
/// First month in use is the acquisition month when acquired in-year,
/// January otherwise; last month is the one preceding an in-year
/// disposal, December otherwise. A disposal in January of the fiscal
/// year yields zero months.
#[must_use]
pub fn months_of_use(
    acquired_on: chrono::NaiveDate,
    disposed_on: Option<chrono::NaiveDate>,
    fiscal_year: i32,
) -> u32 {
    let first = if acquired_on.year() == fiscal_year {
        acquired_on.month()
    } else {
        1
    };
    let last = match disposed_on {
        Some(disposal) if disposal.year() == fiscal_year => disposal.month().saturating_sub(1),
        _ => 12,
    };
    if last < first {
        0
    } else {
        (last - first + 1).min(12)
    }
}

/// Opening balance pending deduction: MOI less prior accumulated
/// depreciation, floored at zero.
#[must_use]
pub fn opening_balance(original_cost: Decimal, prior_depreciation: Decimal) -> Decimal {
    (original_cost - prior_depreciation).max(Decimal::ZERO)
}

/// Current-period fiscal depreciation: straight-line over the months of
/// use, capped at the opening balance, rounded to 2 decimal places.
#[must_use]
pub fn period_depreciation(
    original_cost: Decimal,
    annual_rate: Decimal,
    months: u32,
    opening: Decimal,
) -> Decimal {
    let raw = original_cost * annual_rate / Decimal::from(100) * Decimal::from(months)
        / Decimal::from(12);
    raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .min(opening)
}

/// Shipped calculation stage over the staging store and the published
/// price-index series.
pub struct DbCalculationStage {
    staging: StagingRepository,
    results: CalculationRepository,
    indices: PriceIndexRepository,
    months: MonthMapRepository,
    run_log: RunLogRepository,
    tracker: Arc<ProgressTracker>,
    config: EtlConfig,
}

impl DbCalculationStage {
    /// Creates a calculation stage over the given repositories.
    #[must_use]
    pub fn new(
        staging: StagingRepository,
        results: CalculationRepository,
        indices: PriceIndexRepository,
        months: MonthMapRepository,
        run_log: RunLogRepository,
        tracker: Arc<ProgressTracker>,
        config: EtlConfig,
    ) -> Self {
        Self {
            staging,
            results,
            indices,
            months,
            run_log,
            tracker,
            config,
        }
    }

    async fn execute(
        &self,
        run_id: RunId,
        request: CalculationRequest,
    ) -> Result<CalculationOutcome, CalculationStageError> {
        let tables = self.months.load_tables().await?;

        self.tracker.set_status(run_id, "Calculando valores...");
        let rows = self
            .staging
            .list_for(request.company_id, request.fiscal_year)
            .await?;
        self.tracker
            .set_total(run_id, u64::try_from(rows.len()).unwrap_or(u64::MAX));

        let mut records: u64 = 0;
        let mut skipped: u64 = 0;
        let mut total_reportable_value = Decimal::ZERO;
        let mut floor_test_count: u64 = 0;
        let mut batch: Vec<NewCalculationResult> = Vec::with_capacity(self.config.batch_size);

        for row in &rows {
            match self.value_row(run_id, request.fiscal_year, row, &tables).await? {
                Some(result) => {
                    total_reportable_value += result.result.reportable_value;
                    if result.result.floor_test_applied {
                        floor_test_count += 1;
                    }
                    batch.push(result);
                    records += 1;
                }
                None => skipped += 1,
            }

            if batch.len() >= self.config.batch_size {
                self.results.insert_batch(&batch).await?;
                batch.clear();
                self.tracker.record_counts(run_id, records + skipped, skipped);
            }
        }
        self.results.insert_batch(&batch).await?;
        self.tracker.record_counts(run_id, records + skipped, skipped);

        Ok(CalculationOutcome {
            run_id,
            records,
            skipped,
            total_reportable_value,
            floor_test_count,
        })
    }

    /// Values one staged row. Returns `Ok(None)` for row-level
    /// validation failures, which are counted and never abort the run.
    async fn value_row(
        &self,
        run_id: RunId,
        fiscal_year: i32,
        row: &StagedAsset,
        tables: &safeharbor_core::indexation::MonthTables,
    ) -> Result<Option<NewCalculationResult>, CalculationStageError> {
        let (Some(acquired_on), Some(cost_local), Some(annual_rate)) =
            (row.acquired_on, row.cost_local, row.annual_rate)
        else {
            warn!(
                asset_number = row.asset_number,
                "staged row lacks acquisition date, cost or rate, skipping"
            );
            return Ok(None);
        };

        let selected_month =
            match select_index_month(acquired_on, row.disposed_on, fiscal_year, tables) {
                Ok(month) => month,
                // An unmapped disposal month is a table defect, fatal.
                Err(MonthSelectionError::IndexMonthNotFound(month)) => {
                    return Err(CalculationStageError::DisposalMonthUnmapped(month));
                }
                Err(MonthSelectionError::IndexMonthUndetermined) => {
                    warn!(
                        asset_number = row.asset_number,
                        "no index month determined, skipping"
                    );
                    return Ok(None);
                }
            };

        let acquisition_index = match self
            .find_index(acquired_on.year(), as_i32(acquired_on.month()), row.country_id)
            .await?
        {
            Some(value) => value,
            None => {
                warn!(
                    asset_number = row.asset_number,
                    year = acquired_on.year(),
                    month = acquired_on.month(),
                    "missing acquisition-month index value, skipping"
                );
                return Ok(None);
            }
        };
        let selected_index = match self
            .find_index(fiscal_year, as_i32(selected_month), row.country_id)
            .await?
        {
            Some(value) => value,
            None => {
                warn!(
                    asset_number = row.asset_number,
                    year = fiscal_year,
                    month = selected_month,
                    "missing selected-month index value, skipping"
                );
                return Ok(None);
            }
        };

        let months = months_of_use(acquired_on, row.disposed_on, fiscal_year);
        let prior = row.prior_accumulated_depreciation.unwrap_or(Decimal::ZERO);
        let opening = opening_balance(cost_local, prior);
        let depreciation = period_depreciation(cost_local, annual_rate, months, opening);

        let result = match restate(&IndexationInput {
            original_cost: cost_local,
            opening_balance: opening,
            period_depreciation: depreciation,
            months_of_use: months,
            acquisition_index,
            selected_index,
        }) {
            Ok(result) => result,
            Err(error) => {
                warn!(asset_number = row.asset_number, error = %error, "restatement failed, skipping");
                return Ok(None);
            }
        };

        Ok(Some(NewCalculationResult {
            run_id,
            company_id: row.company_id,
            fiscal_year,
            asset_number: row.asset_number,
            selected_month: as_i32(selected_month),
            acquisition_index,
            selected_index,
            months_of_use: as_i32(months),
            result,
        }))
    }

    /// Published-series index lookup; a missing value is a row-level
    /// condition, any other failure is fatal.
    async fn find_index(
        &self,
        year: i32,
        month: i32,
        country_id: i32,
    ) -> Result<Option<Decimal>, CalculationStageError> {
        match self.indices.find_value(year, month, country_id, None).await {
            Ok(value) => Ok(Some(value)),
            Err(PriceIndexError::IndexNotFound { .. }) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait]
impl CalculationStage for DbCalculationStage {
    async fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculationOutcome, CalculationStageError> {
        let run_id = RunId::new();
        self.tracker.start(run_id, RunType::Calculation);
        self.run_log
            .begin(StartRunInput {
                run_id,
                run_type: RunType::Calculation,
                company_id: request.company_id,
                fiscal_year: request.fiscal_year,
            })
            .await?;

        match self.execute(run_id, request).await {
            Ok(outcome) => {
                self.tracker.update(run_id, |p| {
                    p.total_reportable_value = Some(outcome.total_reportable_value);
                    p.floor_test_count = Some(outcome.floor_test_count);
                });
                self.tracker.complete(run_id);
                self.run_log
                    .finalize(
                        run_id,
                        RunType::Calculation,
                        &RunState::Completed,
                        as_i64(outcome.records + outcome.skipped),
                        as_i64(outcome.records),
                        as_i64(outcome.skipped),
                    )
                    .await?;
                info!(
                    run_id = %run_id,
                    records = outcome.records,
                    total = %outcome.total_reportable_value,
                    floor_applied = outcome.floor_test_count,
                    "calculation run completed"
                );
                Ok(outcome)
            }
            Err(error) => {
                let message = error.to_string();
                self.tracker.fail(run_id, message.clone());
                let snapshot = self.tracker.snapshot(run_id);
                let (processed, succeeded, failed) = terminal_counts(snapshot.as_ref());
                if let Err(log_error) = self
                    .run_log
                    .finalize(
                        run_id,
                        RunType::Calculation,
                        &RunState::Failed(message),
                        processed,
                        succeeded,
                        failed,
                    )
                    .await
                {
                    warn!(run_id = %run_id, error = %log_error, "failed to finalize run log");
                }
                Err(error)
            }
        }
    }
}

fn as_i32(month: u32) -> i32 {
    i32::try_from(month).unwrap_or(i32::MAX)
}

fn as_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[rstest]
    #[case(date(2020, 3, 1), None, 12)] // prior-year asset, full year
    #[case(date(2024, 1, 1), None, 12)] // acquired in January
    #[case(date(2024, 7, 15), None, 6)] // acquired mid-year
    #[case(date(2024, 12, 2), None, 1)] // acquired in December
    fn test_months_of_use_without_disposal(
        #[case] acquired: NaiveDate,
        #[case] disposed: Option<NaiveDate>,
        #[case] expected: u32,
    ) {
        assert_eq!(months_of_use(acquired, disposed, 2024), expected);
    }

    #[rstest]
    #[case(date(2020, 3, 1), date(2024, 7, 10), 6)] // Jan-Jun
    #[case(date(2024, 3, 1), date(2024, 7, 10), 4)] // Mar-Jun
    #[case(date(2020, 3, 1), date(2024, 1, 5), 0)] // disposed in January
    #[case(date(2024, 5, 1), date(2024, 5, 20), 0)] // acquired and disposed in May
    #[case(date(2020, 1, 1), date(2025, 3, 1), 12)] // disposed after the year
    fn test_months_of_use_with_disposal(
        #[case] acquired: NaiveDate,
        #[case] disposed: NaiveDate,
        #[case] expected: u32,
    ) {
        assert_eq!(months_of_use(acquired, Some(disposed), 2024), expected);
    }

    #[test]
    fn test_opening_balance_floored_at_zero() {
        assert_eq!(opening_balance(dec!(1000), dec!(400)), dec!(600));
        assert_eq!(opening_balance(dec!(1000), dec!(1500)), dec!(0));
    }

    #[test]
    fn test_period_depreciation_straight_line() {
        // 120,000 at 10% over 6 months = 6,000.
        assert_eq!(
            period_depreciation(dec!(120000), dec!(10), 6, dec!(90000)),
            dec!(6000.00)
        );
    }

    #[test]
    fn test_period_depreciation_capped_at_opening_balance() {
        // Straight-line says 12,000, but only 500 remains deductible.
        assert_eq!(
            period_depreciation(dec!(120000), dec!(10), 12, dec!(500)),
            dec!(500)
        );
    }
}
