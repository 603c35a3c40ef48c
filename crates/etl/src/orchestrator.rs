//! Run orchestrator.
//!
//! Sequences staging, calculation and durable-log finalization for a
//! full valuation run. Calculation is invoked through the
//! `CalculationStage` trait; when the stage fails, its error text is
//! captured verbatim into the durable log before the error propagates.

use std::sync::Arc;

use tracing::{info, warn};

use safeharbor_db::repositories::{RunLogError, RunLogRepository, StartRunInput};
use safeharbor_shared::types::{RunId, RunState, RunType};

use crate::calculation::{
    CalculationOutcome, CalculationRequest, CalculationStage, CalculationStageError,
};
use crate::pipeline::{PipelineError, StagingOutcome, StagingPipeline, StagingRequest};

/// Errors that fail a full valuation run.
#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    /// Staging failed; nothing was calculated.
    #[error(transparent)]
    Staging(#[from] PipelineError),

    /// Calculation failed after staging completed.
    #[error(transparent)]
    Calculation(#[from] CalculationStageError),

    /// Durable log operation failed.
    #[error(transparent)]
    RunLog(#[from] RunLogError),
}

/// Result of a completed valuation run.
#[derive(Debug, Clone, Copy)]
pub struct ValuationOutcome {
    /// Staging figures.
    pub staging: StagingOutcome,
    /// Calculation figures.
    pub calculation: CalculationOutcome,
}

/// Orchestrator over the staging pipeline and a calculation stage.
pub struct RunOrchestrator {
    pipeline: StagingPipeline,
    calculation: Arc<dyn CalculationStage>,
    run_log: RunLogRepository,
}

impl RunOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        pipeline: StagingPipeline,
        calculation: Arc<dyn CalculationStage>,
        run_log: RunLogRepository,
    ) -> Self {
        Self {
            pipeline,
            calculation,
            run_log,
        }
    }

    /// Executes staging for one (company, fiscal year).
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's first fatal error.
    pub async fn run_staging(
        &self,
        run_id: RunId,
        company_id: i32,
        fiscal_year: i32,
        limit: Option<usize>,
    ) -> Result<StagingOutcome, ValuationError> {
        Ok(self
            .pipeline
            .run(StagingRequest {
                run_id,
                company_id,
                fiscal_year,
                limit,
            })
            .await?)
    }

    /// Executes a full valuation run: staging, then calculation.
    ///
    /// Single-flight per (company, fiscal year) is the caller's
    /// responsibility; concurrent runs for distinct pairs are safe.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error of either stage. A calculation
    /// failure is recorded in the durable log before propagating.
    pub async fn run_full(
        &self,
        run_id: RunId,
        company_id: i32,
        fiscal_year: i32,
        limit: Option<usize>,
    ) -> Result<ValuationOutcome, ValuationError> {
        let staging = self
            .run_staging(run_id, company_id, fiscal_year, limit)
            .await?;

        let calculation = match self
            .calculation
            .calculate(CalculationRequest {
                company_id,
                fiscal_year,
                staging_run_id: staging.run_id,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                // External stages may fail before writing their own
                // log row; record the error verbatim under the staging
                // run id so the failure is durable either way.
                self.record_stage_failure(staging.run_id, company_id, fiscal_year, &error)
                    .await;
                return Err(error.into());
            }
        };

        info!(
            staging_run = %staging.run_id,
            calculation_run = %calculation.run_id,
            records = calculation.records,
            "valuation run completed"
        );
        Ok(ValuationOutcome {
            staging,
            calculation,
        })
    }

    async fn record_stage_failure(
        &self,
        run_id: RunId,
        company_id: i32,
        fiscal_year: i32,
        error: &CalculationStageError,
    ) {
        let begin = self
            .run_log
            .begin(StartRunInput {
                run_id,
                run_type: RunType::Calculation,
                company_id,
                fiscal_year,
            })
            .await;
        let finalize = match begin {
            Ok(_) => {
                self.run_log
                    .finalize(
                        run_id,
                        RunType::Calculation,
                        &RunState::Failed(error.to_string()),
                        0,
                        0,
                        0,
                    )
                    .await
            }
            Err(log_error) => Err(log_error),
        };
        if let Err(log_error) = finalize {
            warn!(run_id = %run_id, error = %log_error, "failed to record calculation failure");
        }
    }
}
