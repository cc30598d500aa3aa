//! PostgreSQL row mappings
//!
//! Conversions between `tokio_postgres` rows and the domain models. Column
//! lists are kept here so the adapter's queries and the mappings agree.

use crate::domain::ids::{BatchId, ProjectId, SubmissionId};
use crate::domain::{ExportBatch, ExportError, ExportResult, Result, Submission, User};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

/// Columns selected for a submission row
pub const SUBMISSION_COLUMNS: &str =
    "id, data, date_received, date_exported, bluebeam_project_id, error_message, export_guid";

/// Columns selected for an export batch row
pub const EXPORT_COLUMNS: &str = "guid, bluebeam_username, date_started, date_finished, result";

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| ExportError::Database(format!("Failed to read column '{}': {}", name, e)))
}

/// Maps a `submission` row
pub fn submission_from_row(row: &Row) -> Result<Submission> {
    let id: i32 = column(row, "id")?;
    let project_id: Option<String> = column(row, "bluebeam_project_id")?;
    let export_guid: Option<Uuid> = column(row, "export_guid")?;

    Ok(Submission {
        id: SubmissionId::new(i64::from(id)),
        data: column::<Value>(row, "data")?,
        date_received: column::<DateTime<Utc>>(row, "date_received")?,
        date_exported: column::<Option<DateTime<Utc>>>(row, "date_exported")?,
        project_id: project_id.map(ProjectId::new).transpose().map_err(|e| {
            ExportError::Database(format!("Invalid project id stored for submission {id}: {e}"))
        })?,
        error_message: column(row, "error_message")?,
        export_id: export_guid.map(BatchId::from_uuid),
    })
}

/// Maps an `export_status` row
pub fn export_from_row(row: &Row) -> Result<ExportBatch> {
    let guid: Uuid = column(row, "guid")?;
    let result: Option<Value> = column(row, "result")?;

    let result = result
        .map(serde_json::from_value::<ExportResult>)
        .transpose()
        .map_err(|e| {
            ExportError::Database(format!("Invalid result stored for export {guid}: {e}"))
        })?;

    Ok(ExportBatch {
        id: BatchId::from_uuid(guid),
        initiator: column(row, "bluebeam_username")?,
        date_started: column(row, "date_started")?,
        date_finished: column(row, "date_finished")?,
        result,
    })
}

/// Maps a `"user"` row
pub fn user_from_row(row: &Row) -> Result<User> {
    let id: i32 = column(row, "id")?;
    Ok(User {
        id: i64::from(id),
        email: column(row, "email")?,
    })
}

/// Converts a submission id for use as an INTEGER parameter
pub fn submission_param(id: SubmissionId) -> Result<i32> {
    i32::try_from(id.value())
        .map_err(|_| ExportError::Database(format!("Submission id {} out of range", id)))
}
