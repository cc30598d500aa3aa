//! Submission domain model
//!
//! A submission arrives as an arbitrary JSON form payload. [`SubmissionData::from_json`]
//! is the single validation boundary: it fails closed on missing required
//! combinations and produces the typed view the export pipeline works with.
//! The raw payload is kept alongside for the failure snapshot.

use super::errors::ValidationError;
use super::ids::{BatchId, ProjectId, SubmissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Form-builder fields that may carry file references, in concatenation order
pub const UPLOAD_FIELDS: [&str; 5] = [
    "files",
    "uploads",
    "requiredUploads",
    "optionalUploads",
    "addendaUploads",
];

/// A file attached to a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub url: String,

    #[serde(rename = "originalName")]
    pub original_name: String,
}

/// Per-submission status-log target
///
/// Identifies the row in the external tracker (by id column) and the column
/// the outcome text is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogTarget {
    pub spreadsheet_id: String,
    pub worksheet_title: String,
    pub id_column_label: String,
    pub status_column_label: String,
}

/// Validated view of a submission payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionData {
    /// Display name for a new project (`project_name`, or legacy `address`)
    pub project_name: Option<String>,

    /// Existing project for a resubmission
    pub project_id: Option<ProjectId>,

    pub building_permit_number: Option<String>,

    pub files: Vec<FileRef>,

    /// External record id used as the status-log row key (`_id`)
    pub external_id: Option<String>,

    pub status_log: Option<StatusLogTarget>,
}

impl SubmissionData {
    /// Validates a raw submission payload
    ///
    /// Either a project name or an existing project id must be present. Every
    /// file entry needs an absolute URL and an original filename. A `logger`
    /// block requires `_id` and all four tracker parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use permit_export::domain::SubmissionData;
    /// use serde_json::json;
    ///
    /// let data = SubmissionData::from_json(&json!({
    ///     "project_name": "123 Market St.",
    ///     "building_permit_number": "202001011234",
    ///     "files": [{"url": "https://files.test.com/a.pdf", "originalName": "a.pdf"}]
    /// })).unwrap();
    ///
    /// assert_eq!(data.project_title().as_deref(), Some("123 Market St. - 202001011234"));
    /// assert_eq!(data.files.len(), 1);
    /// ```
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        let project_name = optional_string(obj, "project_name")?
            .or(optional_string(obj, "address")?)
            .filter(|name| !name.trim().is_empty());

        let project_id = match optional_string(obj, "project_id")? {
            Some(id) if !id.trim().is_empty() => {
                Some(ProjectId::new(id).map_err(|_| ValidationError::InvalidField("project_id"))?)
            }
            _ => None,
        };

        if project_name.is_none() && project_id.is_none() {
            return Err(ValidationError::MissingProject);
        }

        let building_permit_number = optional_string(obj, "building_permit_number")?
            .filter(|permit| !permit.trim().is_empty());

        let files = collect_files(obj)?;

        let external_id = match obj.get("_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => return Err(ValidationError::InvalidField("_id")),
        };

        let status_log = match obj.get("logger") {
            None | Some(Value::Null) => None,
            Some(Value::Object(logger)) => {
                if external_id.is_none() {
                    return Err(ValidationError::MissingExternalId);
                }
                Some(StatusLogTarget {
                    spreadsheet_id: required_logger_field(logger, "spreadsheet_id")?,
                    worksheet_title: required_logger_field(logger, "worksheet_title")?,
                    id_column_label: required_logger_field(logger, "id_column_label")?,
                    status_column_label: required_logger_field(logger, "status_column_label")?,
                })
            }
            Some(_) => return Err(ValidationError::InvalidField("logger")),
        };

        Ok(Self {
            project_name,
            project_id,
            building_permit_number,
            files,
            external_id,
            status_log,
        })
    }

    /// Name of the project to create, suffixed with the permit number if present
    pub fn project_title(&self) -> Option<String> {
        let name = self.project_name.as_ref()?;
        Some(match &self.building_permit_number {
            Some(permit) => format!("{name} - {permit}"),
            None => name.clone(),
        })
    }

    /// Whether this submission targets an existing project
    pub fn is_resubmission(&self) -> bool {
        self.project_id.is_some()
    }
}

fn optional_string(obj: &Map<String, Value>, key: &'static str) -> Result<Option<String>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ValidationError::InvalidField(key)),
    }
}

fn required_logger_field(
    logger: &Map<String, Value>,
    key: &'static str,
) -> Result<String, ValidationError> {
    match logger.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(ValidationError::MissingLoggerField(key)),
    }
}

/// Gathers file references from every known upload field
///
/// Fields are read from the payload itself and then from a nested `data`
/// object, which is where form-builder exports put them.
fn collect_files(obj: &Map<String, Value>) -> Result<Vec<FileRef>, ValidationError> {
    let nested = obj.get("data").and_then(Value::as_object);
    let mut entries = Vec::new();

    for source in std::iter::once(obj).chain(nested) {
        for field in UPLOAD_FIELDS {
            match source.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => entries.extend(items.iter()),
                Some(_) => return Err(ValidationError::InvalidField(field)),
            }
        }
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let url = entry
                .get("url")
                .and_then(Value::as_str)
                .filter(|u| is_absolute_url(u))
                .ok_or(ValidationError::InvalidFileUrl(index))?;
            let original_name = entry
                .get("originalName")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .ok_or(ValidationError::MissingOriginalName(index))?;
            Ok(FileRef {
                url: url.to_string(),
                original_name: original_name.to_string(),
            })
        })
        .collect()
}

fn is_absolute_url(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| u.has_host() && !u.scheme().is_empty())
        .unwrap_or(false)
}

/// A stored submission row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,

    /// Raw payload as received
    pub data: Value,

    pub date_received: DateTime<Utc>,
    pub date_exported: Option<DateTime<Utc>>,
    pub project_id: Option<ProjectId>,
    pub error_message: Option<String>,
    pub export_id: Option<BatchId>,
}

impl Submission {
    /// Whether the submission still awaits export
    pub fn is_pending(&self) -> bool {
        self.date_exported.is_none()
    }
}

/// Truncates an error message to at most `max_chars` characters
///
/// Truncation respects UTF-8 character boundaries.
pub fn truncate_error_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((byte_index, _)) => message[..byte_index].to_string(),
        None => message.to_string(),
    }
}
