//! Durable run log repository.
//!
//! One row per (run id, run type) with merge semantics: a retried start
//! updates the existing row instead of inserting a duplicate. The log
//! is the source of truth for run outcomes after a process restart; the
//! in-memory tracker only serves live polling.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use safeharbor_shared::types::{RunId, RunState, RunType};

use crate::entities::run_logs;

/// Error types for run log operations.
#[derive(Debug, thiserror::Error)]
pub enum RunLogError {
    /// No log row for the (run id, run type) pair.
    #[error("no run log row for run {0} ({1})")]
    RunNotFound(RunId, &'static str),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a run start.
#[derive(Debug, Clone, Copy)]
pub struct StartRunInput {
    /// Run correlation id.
    pub run_id: RunId,
    /// Staging or calculation.
    pub run_type: RunType,
    /// Company under process.
    pub company_id: i32,
    /// Fiscal year under process.
    pub fiscal_year: i32,
}

/// Run log repository.
#[derive(Debug, Clone)]
pub struct RunLogRepository {
    db: DatabaseConnection,
}

impl RunLogRepository {
    /// Creates a new run log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a run start with merge semantics.
    ///
    /// An existing row for the (run id, run type) pair is reset to the
    /// starting state; otherwise a new row is inserted.
    pub async fn begin(&self, input: StartRunInput) -> Result<run_logs::Model, RunLogError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let existing = self.find(input.run_id, input.run_type).await?;

        if let Some(row) = existing {
            let mut active: run_logs::ActiveModel = row.into();
            active.started_at = Set(now);
            active.finished_at = Set(None);
            active.duration_secs = Set(None);
            active.processed = Set(0);
            active.succeeded = Set(0);
            active.failed = Set(0);
            active.state = Set(RunState::Starting.log_label().to_string());
            active.error_message = Set(None);
            Ok(active.update(&self.db).await?)
        } else {
            let row = run_logs::ActiveModel {
                id: Set(Uuid::new_v4()),
                run_id: Set(input.run_id.into_inner()),
                run_type: Set(input.run_type.as_str().to_string()),
                company_id: Set(input.company_id),
                fiscal_year: Set(input.fiscal_year),
                started_at: Set(now),
                finished_at: Set(None),
                duration_secs: Set(None),
                processed: Set(0),
                succeeded: Set(0),
                failed: Set(0),
                state: Set(RunState::Starting.log_label().to_string()),
                error_message: Set(None),
            };
            Ok(row.insert(&self.db).await?)
        }
    }

    /// Persists the processed count of a running run.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` when the run was never registered.
    pub async fn record_progress(
        &self,
        run_id: RunId,
        run_type: RunType,
        processed: i64,
    ) -> Result<(), RunLogError> {
        let row = self
            .find(run_id, run_type)
            .await?
            .ok_or(RunLogError::RunNotFound(run_id, run_type.as_str()))?;

        let mut active: run_logs::ActiveModel = row.into();
        active.processed = Set(processed);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Persists the terminal state of a run.
    ///
    /// Duration is derived from the stored start time. For failed runs
    /// the error message is captured verbatim.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` when the run was never registered.
    pub async fn finalize(
        &self,
        run_id: RunId,
        run_type: RunType,
        state: &RunState,
        processed: i64,
        succeeded: i64,
        failed: i64,
    ) -> Result<(), RunLogError> {
        let row = self
            .find(run_id, run_type)
            .await?
            .ok_or(RunLogError::RunNotFound(run_id, run_type.as_str()))?;

        let now = chrono::Utc::now();
        let duration_secs = (now - row.started_at.to_utc()).num_seconds();
        let error_message = match state {
            RunState::Failed(message) => Some(message.clone()),
            _ => None,
        };

        let mut active: run_logs::ActiveModel = row.into();
        active.finished_at = Set(Some(now.into()));
        active.duration_secs = Set(Some(duration_secs));
        active.processed = Set(processed);
        active.succeeded = Set(succeeded);
        active.failed = Set(failed);
        active.state = Set(state.log_label().to_string());
        active.error_message = Set(error_message);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Finds the log row of a run, if any.
    pub async fn find(
        &self,
        run_id: RunId,
        run_type: RunType,
    ) -> Result<Option<run_logs::Model>, RunLogError> {
        Ok(run_logs::Entity::find()
            .filter(run_logs::Column::RunId.eq(run_id.into_inner()))
            .filter(run_logs::Column::RunType.eq(run_type.as_str()))
            .one(&self.db)
            .await?)
    }

    /// Lists run history, newest first, optionally scoped to a company.
    pub async fn history(
        &self,
        company_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<run_logs::Model>, RunLogError> {
        let mut query = run_logs::Entity::find()
            .order_by_desc(run_logs::Column::StartedAt)
            .limit(limit);
        if let Some(company) = company_id {
            query = query.filter(run_logs::Column::CompanyId.eq(company));
        }
        Ok(query.all(&self.db).await?)
    }
}
