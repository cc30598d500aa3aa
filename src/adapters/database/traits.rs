//! Storage abstraction traits
//!
//! This module defines the trait that storage adapters implement for the
//! exporter's four tables: submissions, export batches, access recipients and
//! the single encrypted credential.

use crate::domain::ids::{BatchId, ProjectId, SubmissionId};
use crate::domain::{ExportBatch, ExportResult, Result, Submission, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Persistence for submissions, export batches, users and the credential
///
/// Every mutating call is committed on its own, so a crash mid-batch keeps
/// the outcomes already recorded.
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Test the database connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create missing tables
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;

    /// Store a validated submission payload
    ///
    /// # Arguments
    ///
    /// * `data` - Raw payload, already validated
    /// * `export_id` - Batch to associate the submission with up front
    async fn insert_submission(&self, data: Value, export_id: Option<BatchId>)
        -> Result<Submission>;

    /// Fetch a submission by id
    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>>;

    /// Number of submissions without an export timestamp
    async fn count_pending(&self) -> Result<usize>;

    /// Assign pending submissions to a batch and return them in id order
    ///
    /// A submission is claimable when it has no export timestamp and is
    /// unassigned, already assigned to `batch_id`, or assigned to a batch that
    /// has finished.
    async fn claim_pending(&self, batch_id: BatchId) -> Result<Vec<Submission>>;

    /// Record a successful export and clear any previous error
    async fn mark_exported(
        &self,
        id: SubmissionId,
        project_id: &ProjectId,
        exported_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Record a failed export
    ///
    /// The caller truncates `error` to the configured maximum length.
    async fn mark_failed(&self, id: SubmissionId, error: &str) -> Result<()>;

    /// Insert a new, unfinished batch record
    async fn create_export(&self, batch: &ExportBatch) -> Result<()>;

    /// Fetch a batch by id
    async fn get_export(&self, id: BatchId) -> Result<Option<ExportBatch>>;

    /// Most recently started batch without a finish timestamp
    async fn find_unfinished_export(&self) -> Result<Option<ExportBatch>>;

    /// Set the finish timestamp and the result summary of a batch
    async fn finish_export(
        &self,
        id: BatchId,
        result: &ExportResult,
        finished_at: DateTime<Utc>,
    ) -> Result<()>;

    /// All access recipients, in insertion order
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Add an access recipient; adding an existing e-mail returns the stored user
    async fn add_user(&self, email: &str) -> Result<User>;

    /// Encrypted credential bytes, if one has been stored
    async fn load_token(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored credential bytes
    async fn save_token(&self, encrypted: &[u8]) -> Result<()>;

    /// Backend name, for logs
    fn backend_name(&self) -> &str;
}
