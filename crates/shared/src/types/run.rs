//! Run lifecycle types.
//!
//! A run is one execution of staging or calculation for a
//! (company, fiscal year) pair, identified by a `RunId`. Internally the
//! lifecycle is a tagged enum; the legacy string convention consumed by
//! polling clients ("Completado" / "Error: ..." prefix) is produced only
//! at the external boundary, never used for control flow.

use serde::{Deserialize, Serialize};

/// The kind of process a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    /// Extract-transform-load into the staging store.
    Staging,
    /// Safe Harbor valuation over staged rows.
    Calculation,
}

impl RunType {
    /// Tag persisted in the durable run log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "ETL",
            Self::Calculation => "CALCULO",
        }
    }
}

/// Run lifecycle state.
///
/// Transitions are one-directional: `Starting → Running → {Completed,
/// Failed}`. A failed run is never resumed; the caller starts a new run
/// id after re-staging from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum RunState {
    /// Run registered, no work done yet.
    Starting,
    /// Run in progress; carries free-form status text.
    Running(String),
    /// Run finished successfully.
    Completed,
    /// Run failed; carries the error message.
    Failed(String),
}

impl RunState {
    /// Returns true once the run can no longer make progress.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// Legacy status string for polling clients.
    ///
    /// Exactly `"Completado"` signals success; an `"Error: "` prefix
    /// signals failure; anything else is in-progress text. Callers match
    /// on these sentinels, so the mapping must not change.
    #[must_use]
    pub fn status_label(&self) -> String {
        match self {
            Self::Starting => "Iniciando".to_string(),
            Self::Running(detail) => detail.clone(),
            Self::Completed => "Completado".to_string(),
            Self::Failed(message) => format!("Error: {message}"),
        }
    }

    /// Stable state label persisted in the durable run log.
    #[must_use]
    pub const fn log_label(&self) -> &'static str {
        match self {
            Self::Starting | Self::Running(_) => "En Proceso",
            Self::Completed => "Completado",
            Self::Failed(_) => "Fallido",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Starting.is_terminal());
        assert!(!RunState::Running("Insertando registros...".into()).is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed("boom".into()).is_terminal());
    }

    #[test]
    fn test_legacy_success_sentinel_is_exact() {
        assert_eq!(RunState::Completed.status_label(), "Completado");
    }

    #[test]
    fn test_legacy_error_prefix() {
        let label = RunState::Failed("missing exchange rate".into()).status_label();
        assert!(label.starts_with("Error: "));
        assert!(label.contains("missing exchange rate"));
    }

    #[test]
    fn test_running_label_is_free_form() {
        let label = RunState::Running("Extrayendo datos...".into()).status_label();
        assert_eq!(label, "Extrayendo datos...");
        assert_ne!(label, "Completado");
        assert!(!label.starts_with("Error"));
    }

    #[test]
    fn test_log_labels() {
        assert_eq!(RunState::Starting.log_label(), "En Proceso");
        assert_eq!(RunState::Running(String::new()).log_label(), "En Proceso");
        assert_eq!(RunState::Completed.log_label(), "Completado");
        assert_eq!(RunState::Failed(String::new()).log_label(), "Fallido");
    }

    #[test]
    fn test_run_type_tags() {
        assert_eq!(RunType::Staging.as_str(), "ETL");
        assert_eq!(RunType::Calculation.as_str(), "CALCULO");
    }
}
