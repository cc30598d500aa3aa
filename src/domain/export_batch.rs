//! Export batch domain model
//!
//! A batch is one run of the orchestrator. Its result summary is written once,
//! when the batch finishes, and is read-only afterwards.

use super::ids::{BatchId, ProjectId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored export batch record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBatch {
    pub id: BatchId,

    /// Account name of whoever triggered the export
    pub initiator: Option<String>,

    pub date_started: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub result: Option<ExportResult>,
}

impl ExportBatch {
    /// Creates a new, unfinished batch
    pub fn new(initiator: Option<String>) -> Self {
        Self {
            id: BatchId::generate(),
            initiator,
            date_started: Utc::now(),
            date_finished: None,
            result: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.date_finished.is_some()
    }

    /// Read-only progress view for the status query
    pub fn status_view(&self) -> ExportStatusView {
        let result = self.result.clone().unwrap_or_default();
        ExportStatusView {
            id: self.id,
            is_finished: self.is_finished(),
            success: result.success,
            failure: result.failure,
            error: result.error,
        }
    }
}

/// Summary of a finished batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    #[serde(default)]
    pub success: Vec<ExportSuccess>,

    #[serde(default)]
    pub failure: Vec<ExportFailure>,

    /// Set when the batch could not be scheduled at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    /// Result of a batch that never ran
    pub fn scheduling_failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.success.len() + self.failure.len()
    }
}

/// A successfully exported submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSuccess {
    pub id: SubmissionId,
    pub project_id: ProjectId,
}

/// A submission that failed to export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFailure {
    pub id: SubmissionId,

    /// Snapshot of the submitted data
    pub data: Value,

    pub err: String,
}

/// Response shape of the export status query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportStatusView {
    pub id: BatchId,
    pub is_finished: bool,
    pub success: Vec<ExportSuccess>,
    pub failure: Vec<ExportFailure>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
