//! Export entry points
//!
//! The operations the front end and the CLI call: creating submissions and
//! batches, triggering an export, querying a batch, and managing the users
//! that receive project access.

use crate::adapters::database::ExportStore;
use crate::core::credentials::CredentialStore;
use crate::core::export::worker::ExportWorkerPool;
use crate::domain::ids::BatchId;
use crate::domain::user::normalize_email;
use crate::domain::{
    CredentialError, ExportBatch, ExportError, ExportResult, ExportStatusView, Result,
    Submission, SubmissionData, User,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Why [`ExportService::trigger_export`] did not start a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new batch was created and queued
    Started(BatchId),
    /// An earlier batch has not finished yet
    InProgress(BatchId),
    /// No submission is waiting for export
    NothingToExport,
}

/// Front door to the export engine
pub struct ExportService {
    store: Arc<dyn ExportStore>,
    credentials: Arc<CredentialStore>,
}

impl ExportService {
    pub fn new(store: Arc<dyn ExportStore>, credentials: Arc<CredentialStore>) -> Self {
        Self { store, credentials }
    }

    /// Validate and store a submission payload
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed payloads; nothing is stored.
    pub async fn create_submission(&self, raw: Value, batch_id: Option<BatchId>) -> Result<Submission> {
        SubmissionData::from_json(&raw)?;
        let submission = self.store.insert_submission(raw, batch_id).await?;
        tracing::info!(submission_id = %submission.id, batch_id = ?batch_id.map(|b| b.to_string()), "Created submission");
        Ok(submission)
    }

    /// Create and store a new, unfinished batch
    pub async fn create_export_record(&self, initiator: Option<String>) -> Result<ExportBatch> {
        let batch = ExportBatch::new(initiator);
        self.store.create_export(&batch).await?;
        tracing::info!(batch_id = %batch.id, initiator = ?batch.initiator, "Created export batch");
        Ok(batch)
    }

    /// Interactive trigger: check the credential, then start a batch on the
    /// worker pool
    ///
    /// Nothing is created when the credential is missing or refused, when a
    /// batch is still running or when nothing is pending. If queueing fails
    /// after the batch was created, the batch is finished with the error.
    ///
    /// # Errors
    ///
    /// Returns a credential error before anything is stored, or the queueing
    /// error after the batch has been closed.
    pub async fn trigger_export(&self, workers: &ExportWorkerPool) -> Result<TriggerOutcome> {
        let credential = self
            .credentials
            .get_valid_credential()
            .await?
            .ok_or(CredentialError::NotAuthorized)?;

        if let Some(running) = self.store.find_unfinished_export().await? {
            tracing::info!(batch_id = %running.id, "Export already in progress");
            return Ok(TriggerOutcome::InProgress(running.id));
        }

        if self.store.count_pending().await? == 0 {
            tracing::info!("Nothing to export");
            return Ok(TriggerOutcome::NothingToExport);
        }

        let batch = self.create_export_record(credential.user_name.clone()).await?;

        if let Err(e) = workers.enqueue(batch.id) {
            let reason = e.to_string();
            self.store
                .finish_export(batch.id, &ExportResult::scheduling_failed(reason.as_str()), Utc::now())
                .await?;
            tracing::error!(batch_id = %batch.id, error = %reason, "Failed to schedule export");
            return Err(e);
        }

        Ok(TriggerOutcome::Started(batch.id))
    }

    /// Progress and result of a batch
    ///
    /// # Errors
    ///
    /// Returns an error for malformed or unknown batch ids.
    pub async fn export_status(&self, batch_id: &str) -> Result<ExportStatusView> {
        let id: BatchId = batch_id
            .parse()
            .map_err(|_| ExportError::Other(format!("Invalid export id: {batch_id}")))?;

        let batch = self
            .store
            .get_export(id)
            .await?
            .ok_or_else(|| ExportError::Other(format!("Unknown export id: {batch_id}")))?;

        Ok(batch.status_view())
    }

    /// Register a user to receive access to new projects
    pub async fn add_user(&self, email: &str) -> Result<User> {
        let email = normalize_email(email).map_err(ExportError::Other)?;
        let user = self.store.add_user(&email).await?;
        tracing::info!(user_id = user.id, email = %user.email, "Registered access recipient");
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }
}
