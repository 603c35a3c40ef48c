//! Staging pipeline.
//!
//! One staging run extracts, classifies and loads the asset rows of a
//! (company, fiscal year) pair. Reruns are idempotent: the run purges
//! staging, calculation and simulated rows before extracting. Rows are
//! inserted in fixed-size batches, one transaction per batch; progress
//! reaches the in-process tracker after every batch and the durable log
//! at a throttled cadence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use safeharbor_core::progress::{ProgressTracker, RunProgress};
use safeharbor_core::staging::{
    classify_cost_basis, resolve_cost, CostBasis, SourceAssetRow, StagedAsset,
};
use safeharbor_db::repositories::{
    CompanyError, CompanyRepository, ExchangeRateError, ExchangeRateRepository, RunLogError,
    RunLogRepository, StagingError, StagingRepository, StartRunInput,
};
use safeharbor_db::source::{SourceLedger, SourceLedgerError};
use safeharbor_shared::config::EtlConfig;
use safeharbor_shared::types::{RunId, RunState, RunType};

/// Decimal places kept for the monthly depreciation rate.
const MONTHLY_RATE_SCALE: u32 = 8;

/// Errors that fail a staging run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Company configuration missing or inactive.
    #[error(transparent)]
    Company(#[from] CompanyError),

    /// Period-end exchange rate missing or invalid.
    #[error(transparent)]
    ExchangeRate(#[from] ExchangeRateError),

    /// Source ledger extraction failed.
    #[error(transparent)]
    Source(#[from] SourceLedgerError),

    /// Staging store operation failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// Durable log operation failed.
    #[error(transparent)]
    RunLog(#[from] RunLogError),
}

/// Parameters of one staging run.
#[derive(Debug, Clone, Copy)]
pub struct StagingRequest {
    /// Run correlation id.
    pub run_id: RunId,
    /// Company to stage.
    pub company_id: i32,
    /// Fiscal year to stage.
    pub fiscal_year: i32,
    /// Optional row cap (test mode).
    pub limit: Option<usize>,
}

/// Result of a completed staging run.
#[derive(Debug, Clone, Copy)]
pub struct StagingOutcome {
    /// Run correlation id.
    pub run_id: RunId,
    /// Rows staged.
    pub staged: u64,
    /// Rows dropped by row-level validation.
    pub skipped: u64,
}

/// Decides whether to persist progress to the durable log.
///
/// The in-process tracker is updated after every batch; the durable log
/// only when the count changed and the minimum interval elapsed since
/// the last write.
#[must_use]
pub fn should_persist(
    processed: u64,
    last_persisted: u64,
    elapsed: Duration,
    min_interval: Duration,
) -> bool {
    processed != last_persisted && elapsed >= min_interval
}

/// Counts to persist in the durable log at a terminal state, from the
/// tracker's last snapshot: (processed, succeeded, failed).
///
/// A failed run keeps the counts reached before the error; the
/// committed batches those counts describe remain in the staging table,
/// so zeroing them would make the log contradict the data.
#[must_use]
pub fn terminal_counts(progress: Option<&RunProgress>) -> (i64, i64, i64) {
    progress.map_or((0, 0, 0), |p| {
        let processed = as_i64(p.processed);
        let skipped = as_i64(p.skipped);
        (processed, processed.saturating_sub(skipped), skipped)
    })
}

/// Derives the monthly depreciation rate from the annual percent rate.
#[must_use]
pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
    (annual_rate / Decimal::from(100) / Decimal::from(12))
        .round_dp_with_strategy(MONTHLY_RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Classifies and normalizes one source row for staging.
///
/// Returns `None` for rows carrying both costing flags; the caller
/// counts and warns, the row is never staged.
#[must_use]
pub fn transform_row(
    row: &SourceAssetRow,
    run_id: RunId,
    fiscal_year: i32,
    period_end_rate: Decimal,
) -> Option<StagedAsset> {
    let basis = classify_cost_basis(row.fiscal_basis, row.reexpressed_basis);
    if basis == CostBasis::Invalid {
        return None;
    }
    let cost = resolve_cost(row, basis, period_end_rate)?;

    Some(StagedAsset {
        company_id: row.company_id,
        fiscal_year,
        run_id,
        asset_number: row.asset_number,
        asset_tag: row.asset_tag.clone(),
        asset_type_id: row.asset_type_id,
        asset_subtype_id: row.asset_subtype_id,
        asset_type_name: row.asset_type_name.clone(),
        description: row.description.clone(),
        currency_id: row.currency_id,
        currency_name: row.currency_name.clone(),
        country_id: row.country_id,
        country_name: row.country_name.clone(),
        acquired_on: row.acquired_on,
        disposed_on: row.disposed_on,
        status: row.status,
        owned: row.owned,
        fiscal_basis: row.fiscal_basis,
        reexpressed_basis: row.reexpressed_basis,
        cost_source_currency: cost.source_currency,
        cost_local: cost.local,
        annual_rate: row.annual_rate,
        monthly_rate: row.annual_rate.map(monthly_rate),
        prior_accumulated_depreciation: row.prior_accumulated_depreciation,
    })
}

/// Staging pipeline over the staging store and a source ledger.
pub struct StagingPipeline {
    companies: CompanyRepository,
    rates: ExchangeRateRepository,
    staging: StagingRepository,
    run_log: RunLogRepository,
    source: Arc<dyn SourceLedger>,
    tracker: Arc<ProgressTracker>,
    config: EtlConfig,
}

impl StagingPipeline {
    /// Creates a pipeline over the given repositories and ledger.
    #[must_use]
    pub fn new(
        companies: CompanyRepository,
        rates: ExchangeRateRepository,
        staging: StagingRepository,
        run_log: RunLogRepository,
        source: Arc<dyn SourceLedger>,
        tracker: Arc<ProgressTracker>,
        config: EtlConfig,
    ) -> Self {
        Self {
            companies,
            rates,
            staging,
            run_log,
            source,
            tracker,
            config,
        }
    }

    /// Executes one staging run end to end.
    ///
    /// The tracker and the durable log reach a terminal state before
    /// this returns, on success and on failure alike.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: configuration, extraction or
    /// batch I/O. Row-level validation failures are counted, never
    /// returned.
    pub async fn run(&self, request: StagingRequest) -> Result<StagingOutcome, PipelineError> {
        self.tracker.start(request.run_id, RunType::Staging);
        self.run_log
            .begin(StartRunInput {
                run_id: request.run_id,
                run_type: RunType::Staging,
                company_id: request.company_id,
                fiscal_year: request.fiscal_year,
            })
            .await?;

        match self.execute(request).await {
            Ok(outcome) => {
                self.tracker.complete(request.run_id);
                self.run_log
                    .finalize(
                        request.run_id,
                        RunType::Staging,
                        &RunState::Completed,
                        as_i64(outcome.staged + outcome.skipped),
                        as_i64(outcome.staged),
                        as_i64(outcome.skipped),
                    )
                    .await?;
                info!(
                    run_id = %request.run_id,
                    company_id = request.company_id,
                    fiscal_year = request.fiscal_year,
                    staged = outcome.staged,
                    skipped = outcome.skipped,
                    "staging run completed"
                );
                Ok(outcome)
            }
            Err(error) => {
                let message = error.to_string();
                self.tracker.fail(request.run_id, message.clone());
                let snapshot = self.tracker.snapshot(request.run_id);
                let (processed, succeeded, failed) = terminal_counts(snapshot.as_ref());
                if let Err(log_error) = self
                    .run_log
                    .finalize(
                        request.run_id,
                        RunType::Staging,
                        &RunState::Failed(message),
                        processed,
                        succeeded,
                        failed,
                    )
                    .await
                {
                    warn!(run_id = %request.run_id, error = %log_error, "failed to finalize run log");
                }
                Err(error)
            }
        }
    }

    async fn execute(&self, request: StagingRequest) -> Result<StagingOutcome, PipelineError> {
        // Step 1: idempotent rerun; purge happens-before extract.
        self.tracker
            .set_status(request.run_id, "Eliminando datos anteriores...");
        let purged = self
            .staging
            .purge(request.company_id, request.fiscal_year)
            .await?;
        info!(
            run_id = %request.run_id,
            staging = purged.staging,
            calculations = purged.calculations,
            simulations = purged.simulations,
            "purged previous rows"
        );

        // Steps 2-3: configuration, fatal when missing.
        let company = self.companies.require_active(request.company_id).await?;
        let rate = self.rates.period_end_rate(request.fiscal_year).await?;

        // Step 4: extract candidates.
        self.tracker
            .set_status(request.run_id, "Extrayendo datos...");
        let rows = self
            .source
            .fetch_candidates(company.company_id, request.fiscal_year, request.limit)
            .await?;
        let total = as_u64(rows.len());
        self.tracker.set_total(request.run_id, total);

        // Steps 5-7: classify, stage in batches, report progress.
        self.tracker
            .set_status(request.run_id, "Insertando registros...");
        let mut staged: u64 = 0;
        let mut skipped: u64 = 0;
        let mut last_persisted: u64 = 0;
        let mut last_persist_at = Instant::now();
        let min_interval = Duration::from_secs(self.config.progress_persist_interval_secs);

        for chunk in rows.chunks(self.config.batch_size) {
            let mut batch = Vec::with_capacity(chunk.len());
            for row in chunk {
                match transform_row(row, request.run_id, request.fiscal_year, rate) {
                    Some(asset) => batch.push(asset),
                    None => {
                        skipped += 1;
                        warn!(
                            run_id = %request.run_id,
                            asset_number = row.asset_number,
                            "row has both costing flags set, skipping"
                        );
                    }
                }
            }

            self.staging.insert_batch(&batch).await?;
            staged += as_u64(batch.len());

            let processed = staged + skipped;
            self.tracker.record_counts(request.run_id, processed, skipped);
            if should_persist(
                processed,
                last_persisted,
                last_persist_at.elapsed(),
                min_interval,
            ) {
                self.run_log
                    .record_progress(request.run_id, RunType::Staging, as_i64(processed))
                    .await?;
                last_persisted = processed;
                last_persist_at = Instant::now();
            }
        }

        Ok(StagingOutcome {
            run_id: request.run_id,
            staged,
            skipped,
        })
    }
}

fn as_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

fn as_i64(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use safeharbor_core::staging::AssetStatus;

    fn source_row() -> SourceAssetRow {
        SourceAssetRow {
            company_id: 122,
            asset_number: 77,
            asset_tag: Some("A-77".into()),
            asset_type_id: 3,
            asset_subtype_id: None,
            asset_type_name: Some("Maquinaria".into()),
            description: None,
            currency_id: Some(1),
            currency_name: Some("MXN".into()),
            country_id: 1,
            country_name: Some("Mexico".into()),
            acquired_on: NaiveDate::from_ymd_opt(2021, 5, 10),
            disposed_on: None,
            status: AssetStatus::Active,
            owned: true,
            fiscal_basis: false,
            reexpressed_basis: false,
            acquisition_cost: Some(dec!(120000)),
            revalued_cost: None,
            reexpressed_cost: None,
            annual_rate: Some(dec!(10)),
            prior_accumulated_depreciation: Some(dec!(30000)),
        }
    }

    #[test]
    fn test_monthly_rate_derivation() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert_eq!(monthly_rate(dec!(10)), dec!(0.00833333));
    }

    #[test]
    fn test_transform_plain_cost_row() {
        let run_id = RunId::new();
        let staged = transform_row(&source_row(), run_id, 2024, dec!(17.5)).unwrap();

        assert_eq!(staged.run_id, run_id);
        assert_eq!(staged.fiscal_year, 2024);
        assert_eq!(staged.cost_local, Some(dec!(120000)));
        assert_eq!(staged.cost_source_currency, None);
        assert_eq!(staged.monthly_rate, Some(dec!(0.00833333)));
    }

    #[test]
    fn test_transform_reexpressed_row_converts_cost() {
        let mut row = source_row();
        row.reexpressed_basis = true;
        row.reexpressed_cost = Some(dec!(1000));

        let staged = transform_row(&row, RunId::new(), 2024, dec!(17.5)).unwrap();
        assert_eq!(staged.cost_source_currency, Some(dec!(1000)));
        assert_eq!(staged.cost_local, Some(dec!(17500.00)));
    }

    #[test]
    fn test_transform_drops_row_with_both_flags() {
        let mut row = source_row();
        row.fiscal_basis = true;
        row.reexpressed_basis = true;

        assert!(transform_row(&row, RunId::new(), 2024, dec!(17.5)).is_none());
    }

    #[test]
    fn test_failure_keeps_checkpointed_counts() {
        // Two batches committed (100 rows, 2 dropped), then the run
        // fails: the terminal log write must carry those counts, not
        // zeros, because the staged rows remain in the table.
        let tracker = ProgressTracker::new();
        let run_id = RunId::new();
        tracker.start(run_id, RunType::Staging);
        tracker.record_counts(run_id, 100, 2);
        tracker.fail(run_id, "batch insert failed");

        let snapshot = tracker.snapshot(run_id);
        assert_eq!(terminal_counts(snapshot.as_ref()), (100, 98, 2));
    }

    #[test]
    fn test_failure_before_any_batch_has_zero_counts() {
        assert_eq!(terminal_counts(None), (0, 0, 0));

        let tracker = ProgressTracker::new();
        let run_id = RunId::new();
        tracker.start(run_id, RunType::Staging);

        let snapshot = tracker.snapshot(run_id);
        assert_eq!(terminal_counts(snapshot.as_ref()), (0, 0, 0));
    }

    #[test]
    fn test_persist_throttle_requires_change_and_interval() {
        let interval = Duration::from_secs(5);

        // Unchanged count never persists, however long it has been.
        assert!(!should_persist(10, 10, Duration::from_secs(60), interval));
        // Changed count waits for the interval.
        assert!(!should_persist(20, 10, Duration::from_secs(1), interval));
        // Changed count and elapsed interval persists.
        assert!(should_persist(20, 10, Duration::from_secs(5), interval));
    }
}
