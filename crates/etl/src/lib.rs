//! Staging pipeline, Safe Harbor calculation stage and run orchestrator.
//!
//! The pipeline extracts candidate rows through the `SourceLedger` seam,
//! classifies and stages them in fixed-size transactional batches; the
//! calculation stage applies month selection and indexation per staged
//! row; the orchestrator sequences staging, calculation and durable-log
//! finalization for a full valuation run.

pub mod calculation;
pub mod orchestrator;
pub mod pipeline;

pub use calculation::{
    CalculationOutcome, CalculationRequest, CalculationStage, CalculationStageError,
    DbCalculationStage,
};
pub use orchestrator::{RunOrchestrator, ValuationError, ValuationOutcome};
pub use pipeline::{PipelineError, StagingOutcome, StagingPipeline, StagingRequest};
