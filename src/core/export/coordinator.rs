//! Export coordinator - drives each submission of a batch to completion
//!
//! Per submission the coordinator walks
//! `PENDING -> (NEW_PROJECT | RESUBMISSION) -> UPLOADING -> (SUCCEEDED | FAILED)`.
//! Failures are isolated per submission; only claiming the batch's
//! submissions and finishing the batch record can fail the batch itself.

use crate::adapters::bluebeam::DocumentService;
use crate::adapters::database::ExportStore;
use crate::adapters::status_log::StatusLogger;
use crate::config::PermitExportConfig;
use crate::core::credentials::CredentialStore;
use crate::core::directories::DirectoryProvisioner;
use crate::core::export::permissions::{assign_full_access, AccessOutcome};
use crate::core::export::summary::ExportSummary;
use crate::core::files::{expand_if_archive, sanitize_filename, FileFetcher};
use crate::domain::ids::{BatchId, FolderId, ProjectId};
use crate::domain::{
    truncate_error_message, ExportError, ExportResult, FileRef, Result, Submission,
    SubmissionData, User, WorkflowFatal,
};
use crate::{log_submission_outcome, log_submission_start};
use chrono::{Local, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs export batches
pub struct ExportCoordinator {
    store: Arc<dyn ExportStore>,
    service: Arc<dyn DocumentService>,
    credentials: Arc<CredentialStore>,
    provisioner: DirectoryProvisioner,
    fetcher: FileFetcher,
    status_logger: Option<StatusLogger>,
    error_message_max_length: usize,
}

impl ExportCoordinator {
    /// Create a coordinator from configuration and shared collaborators
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(
        config: &PermitExportConfig,
        store: Arc<dyn ExportStore>,
        service: Arc<dyn DocumentService>,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(config.bluebeam.timeout_seconds);
        let connect_timeout = Duration::from_secs(config.bluebeam.connect_timeout_seconds);

        let status_logger = config
            .status_log
            .as_ref()
            .map(|cfg| StatusLogger::new(cfg, timeout, config.export.audit_body_limit))
            .transpose()?;

        Ok(Self {
            provisioner: DirectoryProvisioner::new(service.clone(), &config.directories),
            fetcher: FileFetcher::new(&config.storage, timeout, connect_timeout)?,
            status_logger,
            error_message_max_length: config.export.error_message_max_length,
            store,
            service,
            credentials,
        })
    }

    /// Export every pending submission claimable by `batch_id`
    ///
    /// Each outcome is committed as soon as it is known. The batch is
    /// finished with the accumulated result at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending submissions cannot be claimed or the
    /// batch cannot be finished; the batch then stays unfinished.
    pub async fn start_export(&self, batch_id: BatchId) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(batch_id);

        tracing::info!(batch_id = %batch_id, "Starting export batch");

        let submissions = self.store.claim_pending(batch_id).await?;
        summary.total_submissions = submissions.len();
        tracing::info!(batch_id = %batch_id, count = submissions.len(), "Claimed pending submissions");

        let users = match self.store.list_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(batch_id = %batch_id, error = %e, "Failed to load access recipients");
                Vec::new()
            }
        };

        for submission in &submissions {
            self.export_one(batch_id, submission, &users, &mut summary).await;
        }

        summary = summary.with_duration(start_time.elapsed());
        self.store
            .finish_export(batch_id, &summary.result, Utc::now())
            .await?;
        summary.log_summary();

        Ok(summary)
    }

    /// Finish a batch that could not run, recording why
    pub async fn abort_export(&self, batch_id: BatchId, reason: &str) -> Result<()> {
        tracing::error!(batch_id = %batch_id, reason, "Export batch aborted");
        self.store
            .finish_export(batch_id, &ExportResult::scheduling_failed(reason), Utc::now())
            .await
    }

    async fn export_one(
        &self,
        batch_id: BatchId,
        submission: &Submission,
        users: &[User],
        summary: &mut ExportSummary,
    ) {
        let data = SubmissionData::from_json(&submission.data);
        let path = match &data {
            Ok(d) if d.is_resubmission() => "resubmission",
            Ok(_) => "new_project",
            Err(_) => "invalid",
        };
        log_submission_start!(submission.id, batch_id, path);

        let outcome = match &data {
            Ok(data) => self.process(data, users).await,
            Err(e) => Err(ExportError::Validation(e.clone())),
        };
        log_submission_outcome!(submission.id, batch_id, &outcome);

        match outcome {
            Ok(project_id) => {
                match self
                    .store
                    .mark_exported(submission.id, &project_id, Utc::now())
                    .await
                {
                    Ok(()) => summary.record_success(submission.id, project_id),
                    Err(e) => {
                        tracing::error!(
                            submission_id = %submission.id,
                            project_id = %project_id,
                            error = %e,
                            "Exported submission could not be recorded"
                        );
                        summary.record_failure(submission.id, submission.data.clone(), e.to_string());
                    }
                }
            }
            Err(error) => {
                let message = error.to_string();
                let stored = truncate_error_message(&message, self.error_message_max_length);
                if let Err(e) = self.store.mark_failed(submission.id, &stored).await {
                    tracing::error!(submission_id = %submission.id, error = %e, "Failed to record submission failure");
                }

                if let Ok(data) = &data {
                    self.log_status_quietly(&message, data).await;
                }
                summary.record_failure(submission.id, submission.data.clone(), message);
            }
        }
    }

    /// Runs one submission through its path and reports the resulting project
    async fn process(&self, data: &SubmissionData, users: &[User]) -> Result<ProjectId> {
        let credential = self.credentials.require_credential().await?;
        let token = credential.bearer();

        let project_id = match &data.project_id {
            Some(existing) => {
                self.export_resubmission(token, existing, &data.files).await?;
                existing.clone()
            }
            None => self.export_new_project(token, data, users).await?,
        };

        self.log_status(project_id.as_str(), data).await?;
        Ok(project_id)
    }

    async fn export_resubmission(
        &self,
        token: &str,
        project_id: &ProjectId,
        files: &[FileRef],
    ) -> Result<()> {
        if !self.service.project_exists(token, project_id).await? {
            return Err(WorkflowFatal::InvalidProjectId.into());
        }
        let upload_dir = self.provisioner.find_upload_dir(token, project_id).await?;
        self.upload_files(token, project_id, upload_dir, files).await
    }

    async fn export_new_project(
        &self,
        token: &str,
        data: &SubmissionData,
        users: &[User],
    ) -> Result<ProjectId> {
        let title = data
            .project_title()
            .ok_or(crate::domain::ValidationError::MissingProject)?;
        let project_id = self.service.create_project(token, &title).await?;

        match self.populate_new_project(token, &project_id, &data.files, users).await {
            Ok(outcomes) => {
                let granted = outcomes.iter().filter(|o| o.is_granted()).count();
                tracing::debug!(
                    project_id = %project_id,
                    granted,
                    recipients = outcomes.len(),
                    "Assigned project access"
                );
                Ok(project_id)
            }
            Err(error) => {
                if let Err(e) = self.service.delete_project(token, &project_id).await {
                    tracing::error!(project_id = %project_id, error = %e, "Failed to delete project after error");
                }
                Err(error)
            }
        }
    }

    async fn populate_new_project(
        &self,
        token: &str,
        project_id: &ProjectId,
        files: &[FileRef],
        users: &[User],
    ) -> Result<Vec<AccessOutcome>> {
        let upload_dir = self
            .provisioner
            .provision(token, project_id)
            .await?
            .ok_or(WorkflowFatal::NoUploadDirFound)?;

        self.upload_files(token, project_id, upload_dir, files).await?;

        Ok(assign_full_access(self.service.as_ref(), token, project_id, users).await)
    }

    /// Uploads every file into today's submittal folder
    ///
    /// Any failure aborts the remaining files and surfaces as
    /// [`WorkflowFatal::UploadFail`].
    async fn upload_files(
        &self,
        token: &str,
        project_id: &ProjectId,
        upload_dir: FolderId,
        files: &[FileRef],
    ) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        self.try_upload_files(token, project_id, upload_dir, files)
            .await
            .map_err(|e| {
                tracing::warn!(project_id = %project_id, error = %e, "Upload failed");
                WorkflowFatal::UploadFail.into()
            })
    }

    async fn try_upload_files(
        &self,
        token: &str,
        project_id: &ProjectId,
        upload_dir: FolderId,
        files: &[FileRef],
    ) -> Result<()> {
        let folder = self
            .provisioner
            .ensure_submittal_folder(token, project_id, upload_dir, Local::now().date_naive())
            .await?;

        for file in files {
            // Both temporary directories are removed when these drop
            let fetched = self.fetcher.fetch(file).await?;
            let expanded = expand_if_archive(fetched.path()).await?;

            for path in expanded.paths() {
                self.upload_one(token, project_id, folder, path).await?;
            }
        }
        Ok(())
    }

    async fn upload_one(
        &self,
        token: &str,
        project_id: &ProjectId,
        folder: FolderId,
        path: &Path,
    ) -> Result<()> {
        let filename = path
            .file_name()
            .map(|name| sanitize_filename(&name.to_string_lossy()))
            .unwrap_or_default();
        let content = tokio::fs::read(path).await?;

        let ticket = self
            .service
            .initiate_upload(token, project_id, &filename, folder)
            .await?;
        self.service.put_upload(&ticket, content).await?;

        if !self
            .service
            .confirm_upload(token, project_id, ticket.file_id)
            .await?
        {
            return Err(WorkflowFatal::UploadFail.into());
        }

        tracing::info!(project_id = %project_id, file_id = %ticket.file_id, filename = %filename, "Uploaded file");
        Ok(())
    }

    /// Success-path status logging; a failure fails the submission
    async fn log_status(&self, status: &str, data: &SubmissionData) -> Result<()> {
        if data.status_log.is_none() {
            return Ok(());
        }
        let logger = self.status_logger.as_ref().ok_or_else(|| {
            ExportError::Configuration(
                "submission requests status logging but no status_log is configured".to_string(),
            )
        })?;
        logger.log(status, data).await?;
        Ok(())
    }

    /// Failure-path status logging; errors are only logged
    async fn log_status_quietly(&self, status: &str, data: &SubmissionData) {
        if let Err(e) = self.log_status(status, data).await {
            tracing::warn!(error = %e, "Failed to report failure to status tracker");
        }
    }
}
