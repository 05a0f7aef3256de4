// Error taxonomy for the dashboard controller.
//
// Infrastructure code (SQLite, HTTP client setup, config) returns
// anyhow::Result. Anything that crosses into the controller is mapped onto
// one of these variants so callers can match on what went wrong.

use thiserror::Error;

use crate::target::TargetKind;

#[derive(Debug, Error)]
pub enum DeskError {
    /// The target failed format validation. No network call was made.
    #[error("{message}")]
    Validation {
        target: String,
        kind: Option<TargetKind>,
        message: String,
    },

    /// The backend could not be reached or answered with a failure.
    #[error("{0}")]
    Transport(String),

    /// A scan is already pending for this session.
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// An analysis of the current scan is already pending.
    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    /// Analysis or report requested before any successful scan.
    #[error("No scan results to analyze")]
    NoActiveScan,

    /// A response arrived for a scan that has since been replaced.
    #[error("Result for scan {scan_id} arrived after a newer scan started")]
    Superseded { scan_id: String },

    /// Export requested with nothing to export.
    #[error("No data to export")]
    EmptyInput,

    /// The exporter failed to encode the results.
    #[error("Export failed: {0}")]
    Export(String),

    /// Persisted state could not be decoded. Recovered as empty on load.
    #[error("Persisted value under {key} is malformed: {reason}")]
    MalformedPersistedState { key: String, reason: String },

    /// The key-value store itself failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DeskError {
    pub fn validation(target: &str, kind: Option<TargetKind>, message: impl Into<String>) -> Self {
        DeskError::Validation {
            target: target.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Whether this error should raise a user-facing banner.
    ///
    /// Malformed persisted state is recovered silently and stale results are
    /// dropped without telling the user anything.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            DeskError::MalformedPersistedState { .. } | DeskError::Superseded { .. }
        )
    }
}

impl From<anyhow::Error> for DeskError {
    fn from(e: anyhow::Error) -> Self {
        DeskError::Storage(format!("{e:#}"))
    }
}
