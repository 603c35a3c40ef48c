//! Process-wide run progress registry.
//!
//! A single concurrency-safe map from run id to live progress state,
//! written by pipeline stages and polled by external callers during
//! long-running runs. Entries are created at run start and never
//! evicted: a terminal state is the signal to stop polling, and the
//! entry stays readable until process restart. Final state survives
//! restarts only in the durable run log, which is the source of truth.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use safeharbor_shared::types::{RunId, RunState, RunType};
use serde::Serialize;

/// Live progress of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    /// Run correlation id.
    pub run_id: RunId,
    /// Staging or calculation.
    pub run_type: RunType,
    /// Records processed so far.
    pub processed: u64,
    /// Total records, once known.
    pub total: Option<u64>,
    /// Rows dropped by row-level validation.
    pub skipped: u64,
    /// Lifecycle state.
    pub state: RunState,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Total reportable value (calculation runs).
    pub total_reportable_value: Option<Decimal>,
    /// Assets where the 10% floor won (calculation runs).
    pub floor_test_count: Option<u64>,
}

impl RunProgress {
    fn new(run_id: RunId, run_type: RunType) -> Self {
        Self {
            run_id,
            run_type,
            processed: 0,
            total: None,
            skipped: 0,
            state: RunState::Starting,
            started_at: Utc::now(),
            finished_at: None,
            total_reportable_value: None,
            floor_test_count: None,
        }
    }
}

/// Concurrency-safe registry of run progress, shared process-wide.
///
/// Backed by a sharded map: updates for unrelated runs never contend on
/// a single lock, and readers get a consistent snapshot without
/// blocking writers.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    runs: DashMap<RunId, RunProgress>,
}

impl ProgressTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run in the `Starting` state.
    pub fn start(&self, run_id: RunId, run_type: RunType) {
        self.runs.insert(run_id, RunProgress::new(run_id, run_type));
    }

    /// Applies a mutation to a run's progress, if it is registered.
    pub fn update<F>(&self, run_id: RunId, mutate: F)
    where
        F: FnOnce(&mut RunProgress),
    {
        if let Some(mut entry) = self.runs.get_mut(&run_id) {
            mutate(&mut entry);
        }
    }

    /// Moves a run to `Running` with the given status text.
    pub fn set_status(&self, run_id: RunId, detail: impl Into<String>) {
        self.update(run_id, |p| p.state = RunState::Running(detail.into()));
    }

    /// Records the total record count once known.
    pub fn set_total(&self, run_id: RunId, total: u64) {
        self.update(run_id, |p| p.total = Some(total));
    }

    /// Records processed and skipped counters.
    pub fn record_counts(&self, run_id: RunId, processed: u64, skipped: u64) {
        self.update(run_id, |p| {
            p.processed = processed;
            p.skipped = skipped;
        });
    }

    /// Marks a run completed.
    pub fn complete(&self, run_id: RunId) {
        self.update(run_id, |p| {
            p.state = RunState::Completed;
            p.finished_at = Some(Utc::now());
        });
    }

    /// Marks a run failed with the given message.
    pub fn fail(&self, run_id: RunId, message: impl Into<String>) {
        self.update(run_id, |p| {
            p.state = RunState::Failed(message.into());
            p.finished_at = Some(Utc::now());
        });
    }

    /// Returns a point-in-time snapshot of a run's progress.
    #[must_use]
    pub fn snapshot(&self, run_id: RunId) -> Option<RunProgress> {
        self.runs.get(&run_id).map(|entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lifecycle() {
        let tracker = ProgressTracker::new();
        let run_id = RunId::new();

        tracker.start(run_id, RunType::Staging);
        assert_eq!(tracker.snapshot(run_id).unwrap().state, RunState::Starting);

        tracker.set_status(run_id, "Insertando registros...");
        tracker.set_total(run_id, 500);
        tracker.record_counts(run_id, 100, 2);

        let snap = tracker.snapshot(run_id).unwrap();
        assert_eq!(snap.processed, 100);
        assert_eq!(snap.skipped, 2);
        assert_eq!(snap.total, Some(500));
        assert!(!snap.state.is_terminal());

        tracker.complete(run_id);
        let snap = tracker.snapshot(run_id).unwrap();
        assert_eq!(snap.state, RunState::Completed);
        assert!(snap.finished_at.is_some());
    }

    #[test]
    fn test_terminal_entry_stays_readable() {
        let tracker = ProgressTracker::new();
        let run_id = RunId::new();

        tracker.start(run_id, RunType::Calculation);
        tracker.fail(run_id, "missing exchange rate");

        // No eviction: pollers can still observe the terminal state.
        let snap = tracker.snapshot(run_id).unwrap();
        assert_eq!(
            snap.state,
            RunState::Failed("missing exchange rate".into())
        );
        assert!(snap.state.status_label().starts_with("Error: "));
    }

    #[test]
    fn test_unknown_run_snapshot_is_none() {
        let tracker = ProgressTracker::new();
        assert!(tracker.snapshot(RunId::new()).is_none());
    }

    #[test]
    fn test_concurrent_runs_do_not_interfere() {
        let tracker = Arc::new(ProgressTracker::new());
        let run_ids: Vec<RunId> = (0..8).map(|_| RunId::new()).collect();

        for &run_id in &run_ids {
            tracker.start(run_id, RunType::Staging);
        }

        let handles: Vec<_> = run_ids
            .iter()
            .map(|&run_id| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for processed in 1..=1000u64 {
                        tracker.record_counts(run_id, processed, 0);
                    }
                    tracker.complete(run_id);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for &run_id in &run_ids {
            let snap = tracker.snapshot(run_id).unwrap();
            assert_eq!(snap.processed, 1000);
            assert_eq!(snap.state, RunState::Completed);
        }
    }
}
