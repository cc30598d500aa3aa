//! PostgreSQL adapter implementing the storage trait

use crate::adapters::database::traits::ExportStore;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    export_from_row, submission_from_row, submission_param, user_from_row, EXPORT_COLUMNS,
    SUBMISSION_COLUMNS,
};
use crate::domain::ids::{BatchId, ProjectId, SubmissionId};
use crate::domain::{ExportBatch, ExportError, ExportResult, Result, Submission, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Fixed primary key of the single credential row
const TOKEN_ROW_ID: i32 = 1;

/// Claims every pending submission the batch may take
///
/// Pending means not yet exported. Rows held by another unfinished batch are
/// left alone.
fn claim_pending_query() -> String {
    // Rows another transaction is claiming are skipped, not waited on
    format!(
        "WITH claimable AS ( \
             SELECT p.id AS claim_id FROM submission p \
             WHERE p.date_exported IS NULL \
               AND (p.export_guid IS NULL \
                    OR p.export_guid = $1 \
                    OR EXISTS (SELECT 1 FROM export_status e \
                               WHERE e.guid = p.export_guid AND e.date_finished IS NOT NULL)) \
             ORDER BY p.id \
             FOR UPDATE SKIP LOCKED) \
         UPDATE submission SET export_guid = $1 \
         FROM claimable WHERE submission.id = claimable.claim_id \
         RETURNING {}",
        SUBMISSION_COLUMNS
    )
}

/// PostgreSQL implementation of [`ExportStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl ExportStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    async fn insert_submission(
        &self,
        data: Value,
        export_id: Option<BatchId>,
    ) -> Result<Submission> {
        let export_guid = export_id.map(|id| *id.as_uuid());
        let query = format!(
            "INSERT INTO submission (data, export_guid) VALUES ($1, $2) RETURNING {}",
            SUBMISSION_COLUMNS
        );

        let row = self
            .client
            .query_opt(&query, &[&data, &export_guid])
            .await?
            .ok_or_else(|| ExportError::Database("Insert returned no row".to_string()))?;

        submission_from_row(&row)
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        let query = format!("SELECT {} FROM submission WHERE id = $1", SUBMISSION_COLUMNS);
        let id = submission_param(id)?;

        self.client
            .query_opt(&query, &[&id])
            .await?
            .map(|row| submission_from_row(&row))
            .transpose()
    }

    async fn count_pending(&self) -> Result<usize> {
        let row = self
            .client
            .query_opt(
                "SELECT COUNT(*) AS pending FROM submission WHERE date_exported IS NULL",
                &[],
            )
            .await?
            .ok_or_else(|| ExportError::Database("Count returned no row".to_string()))?;

        let pending: i64 = row
            .try_get("pending")
            .map_err(|e| ExportError::Database(format!("Failed to read count: {}", e)))?;

        Ok(usize::try_from(pending).unwrap_or(0))
    }

    async fn claim_pending(&self, batch_id: BatchId) -> Result<Vec<Submission>> {
        let guid = *batch_id.as_uuid();
        let query = claim_pending_query();

        let rows = self.client.query(&query, &[&guid]).await?;
        let mut submissions = rows
            .iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>>>()?;

        // RETURNING carries no ordering guarantee
        submissions.sort_by_key(|s| s.id);

        tracing::debug!(
            batch_id = %batch_id,
            claimed = submissions.len(),
            "Claimed pending submissions"
        );
        Ok(submissions)
    }

    async fn mark_exported(
        &self,
        id: SubmissionId,
        project_id: &ProjectId,
        exported_at: DateTime<Utc>,
    ) -> Result<()> {
        let id = submission_param(id)?;
        self.client
            .execute(
                "UPDATE submission \
                 SET date_exported = $2, bluebeam_project_id = $3, error_message = NULL \
                 WHERE id = $1",
                &[&id, &exported_at, &project_id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: SubmissionId, error: &str) -> Result<()> {
        let id = submission_param(id)?;
        self.client
            .execute(
                "UPDATE submission SET error_message = $2 WHERE id = $1",
                &[&id, &error],
            )
            .await?;
        Ok(())
    }

    async fn create_export(&self, batch: &ExportBatch) -> Result<()> {
        let result = batch.result.as_ref().map(serde_json::to_value).transpose()?;
        self.client
            .execute(
                "INSERT INTO export_status \
                 (guid, bluebeam_username, date_started, date_finished, result) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    batch.id.as_uuid(),
                    &batch.initiator,
                    &batch.date_started,
                    &batch.date_finished,
                    &result,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_export(&self, id: BatchId) -> Result<Option<ExportBatch>> {
        let query = format!("SELECT {} FROM export_status WHERE guid = $1", EXPORT_COLUMNS);

        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .map(|row| export_from_row(&row))
            .transpose()
    }

    async fn find_unfinished_export(&self) -> Result<Option<ExportBatch>> {
        let query = format!(
            "SELECT {} FROM export_status WHERE date_finished IS NULL \
             ORDER BY date_started DESC LIMIT 1",
            EXPORT_COLUMNS
        );

        self.client
            .query_opt(&query, &[])
            .await?
            .map(|row| export_from_row(&row))
            .transpose()
    }

    async fn finish_export(
        &self,
        id: BatchId,
        result: &ExportResult,
        finished_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = serde_json::to_value(result)?;
        let updated = self
            .client
            .execute(
                "UPDATE export_status SET date_finished = $2, result = $3 WHERE guid = $1",
                &[id.as_uuid(), &finished_at, &result],
            )
            .await?;

        if updated == 0 {
            return Err(ExportError::Database(format!("Export {} not found", id)));
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = self
            .client
            .query("SELECT id, email FROM \"user\" ORDER BY id", &[])
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn add_user(&self, email: &str) -> Result<User> {
        let row = self
            .client
            .query_opt(
                "INSERT INTO \"user\" (email) VALUES ($1) \
                 ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email \
                 RETURNING id, email",
                &[&email],
            )
            .await?
            .ok_or_else(|| ExportError::Database("Insert returned no row".to_string()))?;
        user_from_row(&row)
    }

    async fn load_token(&self) -> Result<Option<Vec<u8>>> {
        let row = self
            .client
            .query_opt("SELECT value FROM token WHERE id = $1", &[&TOKEN_ROW_ID])
            .await?;

        row.map(|r| {
            r.try_get::<_, Vec<u8>>("value")
                .map_err(|e| ExportError::Database(format!("Failed to read token: {}", e)))
        })
        .transpose()
    }

    async fn save_token(&self, encrypted: &[u8]) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO token (id, value) VALUES ($1, $2) \
                 ON CONFLICT (id) DO UPDATE SET value = EXCLUDED.value",
                &[&TOKEN_ROW_ID, &encrypted],
            )
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
