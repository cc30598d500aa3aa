//! Export summary and reporting
//!
//! This module accumulates per-submission outcomes into the batch result and
//! reports them once the batch finishes.

use crate::domain::ids::{BatchId, ProjectId, SubmissionId};
use crate::domain::{ExportFailure, ExportResult, ExportSuccess};
use serde_json::Value;
use std::time::Duration;

/// Summary of one export batch
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Batch being summarized
    pub batch_id: BatchId,

    /// Number of submissions claimed by the batch
    pub total_submissions: usize,

    /// Duration of the export
    pub duration: Duration,

    /// Ordered successes and failures, as stored on the batch
    pub result: ExportResult,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            total_submissions: 0,
            duration: Duration::from_secs(0),
            result: ExportResult::default(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn record_success(&mut self, id: SubmissionId, project_id: ProjectId) {
        self.result.success.push(ExportSuccess { id, project_id });
    }

    pub fn record_failure(&mut self, id: SubmissionId, data: Value, err: impl Into<String>) {
        self.result.failure.push(ExportFailure {
            id,
            data,
            err: err.into(),
        });
    }

    pub fn successful_exports(&self) -> usize {
        self.result.success.len()
    }

    pub fn failed_exports(&self) -> usize {
        self.result.failure.len()
    }

    /// Check if the export was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.result.failure.is_empty() && self.result.error.is_none()
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_submissions == 0 {
            return 100.0;
        }
        (self.successful_exports() as f64 / self.total_submissions as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            batch_id = %self.batch_id,
            total = self.total_submissions,
            successful = self.successful_exports(),
            failed = self.failed_exports(),
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        for failure in &self.result.failure {
            tracing::warn!(
                batch_id = %self.batch_id,
                submission_id = %failure.id,
                error = %failure.err,
                "Submission failed to export"
            );
        }
    }
}
