//! In-process storage backend
//!
//! Keeps every table in memory behind a mutex. Used for local dry runs
//! (`database_target = "memory"`) and by the test suite.

use crate::adapters::database::traits::ExportStore;
use crate::domain::ids::{BatchId, ProjectId, SubmissionId};
use crate::domain::{ExportBatch, ExportError, ExportResult, Result, Submission, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    submissions: BTreeMap<SubmissionId, Submission>,
    next_submission_id: i64,
    exports: Vec<ExportBatch>,
    users: Vec<User>,
    token: Option<Vec<u8>>,
}

/// Storage backend holding all rows in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| ExportError::Database("memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl ExportStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        self.tables().map(|_| ())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_submission(
        &self,
        data: Value,
        export_id: Option<BatchId>,
    ) -> Result<Submission> {
        let mut tables = self.tables()?;

        if let Some(batch) = export_id {
            if !tables.exports.iter().any(|e| e.id == batch) {
                return Err(ExportError::Database(format!(
                    "Export {} does not exist",
                    batch
                )));
            }
        }

        tables.next_submission_id += 1;
        let submission = Submission {
            id: SubmissionId::new(tables.next_submission_id),
            data,
            date_received: Utc::now(),
            date_exported: None,
            project_id: None,
            error_message: None,
            export_id,
        };
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        Ok(self.tables()?.submissions.get(&id).cloned())
    }

    async fn count_pending(&self) -> Result<usize> {
        Ok(self
            .tables()?
            .submissions
            .values()
            .filter(|s| s.is_pending())
            .count())
    }

    async fn claim_pending(&self, batch_id: BatchId) -> Result<Vec<Submission>> {
        let mut guard = self.tables()?;
        let tables = &mut *guard;

        let finished: Vec<BatchId> = tables
            .exports
            .iter()
            .filter(|e| e.is_finished())
            .map(|e| e.id)
            .collect();

        let mut claimed = Vec::new();
        for submission in tables.submissions.values_mut() {
            if !submission.is_pending() {
                continue;
            }
            let claimable = match submission.export_id {
                None => true,
                Some(owner) => owner == batch_id || finished.contains(&owner),
            };
            if claimable {
                submission.export_id = Some(batch_id);
                claimed.push(submission.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_exported(
        &self,
        id: SubmissionId,
        project_id: &ProjectId,
        exported_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables()?;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| ExportError::Database(format!("Submission {} not found", id)))?;
        submission.date_exported = Some(exported_at);
        submission.project_id = Some(project_id.clone());
        submission.error_message = None;
        Ok(())
    }

    async fn mark_failed(&self, id: SubmissionId, error: &str) -> Result<()> {
        let mut tables = self.tables()?;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| ExportError::Database(format!("Submission {} not found", id)))?;
        submission.error_message = Some(error.to_string());
        Ok(())
    }

    async fn create_export(&self, batch: &ExportBatch) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.exports.iter().any(|e| e.id == batch.id) {
            return Err(ExportError::Database(format!(
                "Export {} already exists",
                batch.id
            )));
        }
        tables.exports.push(batch.clone());
        Ok(())
    }

    async fn get_export(&self, id: BatchId) -> Result<Option<ExportBatch>> {
        Ok(self.tables()?.exports.iter().find(|e| e.id == id).cloned())
    }

    async fn find_unfinished_export(&self) -> Result<Option<ExportBatch>> {
        Ok(self
            .tables()?
            .exports
            .iter()
            .filter(|e| !e.is_finished())
            .max_by_key(|e| e.date_started)
            .cloned())
    }

    async fn finish_export(
        &self,
        id: BatchId,
        result: &ExportResult,
        finished_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables()?;
        let batch = tables
            .exports
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ExportError::Database(format!("Export {} not found", id)))?;
        batch.date_finished = Some(finished_at);
        batch.result = Some(result.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables()?.users.clone())
    }

    async fn add_user(&self, email: &str) -> Result<User> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.users.iter().find(|u| u.email == email) {
            return Ok(existing.clone());
        }
        let user = User {
            id: tables.users.len() as i64 + 1,
            email: email.to_string(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn load_token(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.tables()?.token.clone())
    }

    async fn save_token(&self, encrypted: &[u8]) -> Result<()> {
        self.tables()?.token = Some(encrypted.to_vec());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
