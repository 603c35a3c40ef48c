//! Run endpoints.
//!
//! Staging and valuation runs execute on a spawned tokio task; the
//! endpoints return the run id immediately and clients poll
//! `/runs/{id}/progress`. The progress response carries the legacy
//! `estado` string convention: exactly `"Completado"` on success, an
//! `"Error: "` prefix on failure.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use safeharbor_db::repositories::{
    CalculationRepository, CompanyRepository, ExchangeRateRepository, MonthMapRepository,
    PriceIndexRepository, RunLogRepository, StagingRepository,
};
use safeharbor_db::source::SeaOrmSourceLedger;
use safeharbor_etl::{DbCalculationStage, RunOrchestrator, StagingPipeline};
use safeharbor_shared::types::RunId;

use crate::AppState;

/// Creates the run routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/runs/staging", post(start_staging))
        .route("/runs/valuation", post(start_valuation))
        .route("/runs/{id}/progress", get(run_progress))
        .route("/runs/{id}/results", get(run_results))
        .route("/runs/history", get(run_history))
}

/// Request body for starting a run.
#[derive(Debug, Deserialize)]
pub struct StartRunRequest {
    /// Company to process.
    pub company_id: i32,
    /// Fiscal year to process.
    pub fiscal_year: i32,
    /// Optional row cap (test mode).
    pub limit: Option<usize>,
}

/// Response for a started run.
#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    /// Run id for progress polling.
    pub run_id: RunId,
}

/// Progress snapshot response.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// Run id.
    pub run_id: RunId,
    /// Staging or calculation.
    pub run_type: &'static str,
    /// Legacy status string consumed by polling clients.
    pub estado: String,
    /// Records processed so far.
    pub processed: u64,
    /// Total records, once known.
    pub total: Option<u64>,
    /// Rows dropped by row-level validation.
    pub skipped: u64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Total reportable value (calculation runs).
    pub total_reportable_value: Option<Decimal>,
    /// Assets where the 10% floor won (calculation runs).
    pub floor_test_count: Option<u64>,
}

fn build_orchestrator(state: &AppState) -> RunOrchestrator {
    let db: DatabaseConnection = (*state.db).clone();

    let pipeline = StagingPipeline::new(
        CompanyRepository::new(db.clone()),
        ExchangeRateRepository::new(db.clone()),
        StagingRepository::new(db.clone()),
        RunLogRepository::new(db.clone()),
        Arc::new(SeaOrmSourceLedger::new(db.clone())),
        Arc::clone(&state.tracker),
        state.etl_config.clone(),
    );
    let calculation = DbCalculationStage::new(
        StagingRepository::new(db.clone()),
        CalculationRepository::new(db.clone()),
        PriceIndexRepository::new(db.clone()),
        MonthMapRepository::new(db.clone()),
        RunLogRepository::new(db.clone()),
        Arc::clone(&state.tracker),
        state.etl_config.clone(),
    );
    RunOrchestrator::new(pipeline, Arc::new(calculation), RunLogRepository::new(db))
}

/// POST `/runs/staging` - Start a staging run in the background.
async fn start_staging(
    State(state): State<AppState>,
    Json(request): Json<StartRunRequest>,
) -> impl IntoResponse {
    let run_id = RunId::new();
    let orchestrator = build_orchestrator(&state);

    tokio::spawn(async move {
        if let Err(e) = orchestrator
            .run_staging(run_id, request.company_id, request.fiscal_year, request.limit)
            .await
        {
            error!(run_id = %run_id, error = %e, "staging run failed");
        }
    });

    (StatusCode::ACCEPTED, Json(StartRunResponse { run_id }))
}

/// POST `/runs/valuation` - Start a full staging + calculation run.
async fn start_valuation(
    State(state): State<AppState>,
    Json(request): Json<StartRunRequest>,
) -> impl IntoResponse {
    let run_id = RunId::new();
    let orchestrator = build_orchestrator(&state);

    tokio::spawn(async move {
        if let Err(e) = orchestrator
            .run_full(run_id, request.company_id, request.fiscal_year, request.limit)
            .await
        {
            error!(run_id = %run_id, error = %e, "valuation run failed");
        }
    });

    (StatusCode::ACCEPTED, Json(StartRunResponse { run_id }))
}

/// GET `/runs/{id}/progress` - Poll the progress of a run.
async fn run_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Ok(run_id) = RunId::from_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_error", "message": "invalid run id" })),
        )
            .into_response();
    };

    match state.tracker.snapshot(run_id) {
        Some(progress) => {
            let response = ProgressResponse {
                run_id: progress.run_id,
                run_type: progress.run_type.as_str(),
                estado: progress.state.status_label(),
                processed: progress.processed,
                total: progress.total,
                skipped: progress.skipped,
                started_at: progress.started_at,
                finished_at: progress.finished_at,
                total_reportable_value: progress.total_reportable_value,
                floor_test_count: progress.floor_test_count,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "unknown run id" })),
        )
            .into_response(),
    }
}

/// GET `/runs/{id}/results` - Retrieve the results of a calculation run.
///
/// Returns the per-asset restated figures in stable asset order plus
/// the run's aggregate totals. A run id with no stored results is a
/// 404, whether the run is unknown, still in progress, or a staging
/// run.
async fn run_results(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(run_id) = RunId::from_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "validation_error", "message": "invalid run id" })),
        )
            .into_response();
    };

    let repository = CalculationRepository::new((*state.db).clone());
    let rows = match repository.list_for_run(run_id).await {
        Ok(rows) => rows,
        Err(e) => {
            error!(run_id = %run_id, error = %e, "failed to list calculation results");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response();
        }
    };
    if rows.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "no results stored for run id" })),
        )
            .into_response();
    }

    match repository.totals_for_run(run_id).await {
        Ok(totals) => (
            StatusCode::OK,
            Json(json!({ "run_id": run_id, "totals": totals, "results": rows })),
        )
            .into_response(),
        Err(e) => {
            error!(run_id = %run_id, error = %e, "failed to aggregate run totals");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}

/// Query parameters for run history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Scope to one company.
    pub company_id: Option<i32>,
    /// Maximum rows (default 50).
    pub limit: Option<u64>,
}

/// GET `/runs/history` - List past runs, newest first.
async fn run_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let run_log = RunLogRepository::new((*state.db).clone());
    match run_log
        .history(query.company_id, query.limit.unwrap_or(50))
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(json!({ "runs": rows }))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list run history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}
