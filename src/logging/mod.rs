//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Human-readable console output
//! - JSON file logging with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use permit_export::logging::init_logging;
//! use permit_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a submission's export
///
/// # Example
///
/// ```no_run
/// use permit_export::log_submission_start;
/// use permit_export::domain::ids::{BatchId, SubmissionId};
///
/// let batch_id = BatchId::generate();
/// log_submission_start!(SubmissionId::new(7), batch_id, "new_project");
/// ```
#[macro_export]
macro_rules! log_submission_start {
    ($submission_id:expr, $batch_id:expr, $path:expr) => {
        tracing::info!(
            submission_id = %$submission_id,
            batch_id = %$batch_id,
            path = $path,
            "Exporting submission"
        );
    };
}

/// Log the outcome of a submission's export
///
/// Successes are logged at `info`, failures at `warn`.
///
/// # Example
///
/// ```no_run
/// use permit_export::log_submission_outcome;
/// use permit_export::domain::ids::{BatchId, ProjectId, SubmissionId};
///
/// let batch_id = BatchId::generate();
/// let outcome: Result<ProjectId, String> = Err("ERR_UPLOAD_FAIL".to_string());
/// log_submission_outcome!(SubmissionId::new(7), batch_id, &outcome);
/// ```
#[macro_export]
macro_rules! log_submission_outcome {
    ($submission_id:expr, $batch_id:expr, $outcome:expr) => {
        match $outcome {
            Ok(project_id) => tracing::info!(
                submission_id = %$submission_id,
                batch_id = %$batch_id,
                project_id = %project_id,
                "Submission exported"
            ),
            Err(error) => tracing::warn!(
                submission_id = %$submission_id,
                batch_id = %$batch_id,
                error = %error,
                "Submission export failed"
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::ids::{BatchId, ProjectId, SubmissionId};

    #[test]
    fn test_macros_expand_without_subscriber() {
        let batch_id = BatchId::generate();
        log_submission_start!(SubmissionId::new(1), batch_id, "resubmission");

        let ok: Result<ProjectId, String> = Ok(ProjectId::new("123-456-789").unwrap());
        log_submission_outcome!(SubmissionId::new(1), batch_id, &ok);

        let err: Result<ProjectId, String> = Err("ERR_UPLOAD_FAIL".to_string());
        log_submission_outcome!(SubmissionId::new(1), batch_id, &err);
    }
}
