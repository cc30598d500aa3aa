//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. The orchestrator
//! pattern-matches on these kinds instead of comparing error strings, and none
//! of them expose third-party HTTP or database types.

use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
/// It wraps the specific error kinds and provides context for error handling.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document service, status tracker or file host errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Malformed submission payloads
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Named workflow failures surfaced to the batch result
    #[error(transparent)]
    Workflow(#[from] WorkflowFatal),

    /// Access credential errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by remote HTTP collaborators
///
/// Every non-2xx response becomes a `Status` error, except the explicitly
/// tolerated "project not found" probe.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status
    #[error("{method} {url} failed with status {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect, timeout, TLS)
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// The remote answered 2xx with a body we could not use
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// The document service reported an error code inside a success response
    #[error("Document service rejected the request (code {code}): {message}")]
    Rejected { code: i64, message: String },
}

impl RemoteError {
    /// HTTP status of the failure, if the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Submission payload validation errors
///
/// These are raised when a submission is created and never reach the export
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload is not a JSON object
    #[error("submission payload must be a JSON object")]
    NotAnObject,

    /// Neither a project name nor an existing project id was supplied
    #[error("project_name or project_id is required")]
    MissingProject,

    /// A file entry has no usable URL
    #[error("invalid file url at index {0}")]
    InvalidFileUrl(usize),

    /// A file entry has no original filename
    #[error("missing originalName in file json at index {0}")]
    MissingOriginalName(usize),

    /// A field has the wrong JSON type
    #[error("field '{0}' has an invalid type")]
    InvalidField(&'static str),

    /// Status logging was requested without an external record id
    #[error("_id is required when logger configuration is present")]
    MissingExternalId,

    /// Status logging configuration is incomplete
    #[error("logger configuration is missing '{0}'")]
    MissingLoggerField(&'static str),
}

/// Named, stable workflow failures
///
/// The display text is the stable code operators and UIs match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowFatal {
    /// No upload folder could be determined for the project
    #[error("ERR_NO_UPLOAD_DIR_FOUND")]
    NoUploadDirFound,

    /// A resubmission referenced a project that does not exist
    #[error("ERR_INVALID_PROJECT_ID")]
    InvalidProjectId,

    /// A file could not be fetched, expanded or uploaded
    #[error("ERR_UPLOAD_FAIL")]
    UploadFail,
}

impl WorkflowFatal {
    /// Stable code for this failure
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowFatal::NoUploadDirFound => "ERR_NO_UPLOAD_DIR_FOUND",
            WorkflowFatal::InvalidProjectId => "ERR_INVALID_PROJECT_ID",
            WorkflowFatal::UploadFail => "ERR_UPLOAD_FAIL",
        }
    }
}

/// Access credential errors
///
/// Any of these aborts an export trigger before a batch is created.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credential has been stored yet
    #[error("no stored credential, run `permit-export authorize` first")]
    NotAuthorized,

    /// The authorization server refused the grant
    #[error("authorization denied: {0}")]
    Denied(String),

    /// The stored credential could not be decrypted or decoded
    #[error("stored credential is unreadable: {0}")]
    Corrupt(String),

    /// The encryption key is not a valid Fernet key
    #[error("invalid credential encryption key")]
    InvalidKey,
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_fatal_display_is_stable_code() {
        let err: ExportError = WorkflowFatal::InvalidProjectId.into();
        assert_eq!(err.to_string(), "ERR_INVALID_PROJECT_ID");
        assert_eq!(
            ExportError::from(WorkflowFatal::UploadFail).to_string(),
            WorkflowFatal::UploadFail.code()
        );
        assert_eq!(
            WorkflowFatal::NoUploadDirFound.to_string(),
            "ERR_NO_UPLOAD_DIR_FOUND"
        );
    }

    #[test]
    fn test_remote_error_conversion() {
        let remote = RemoteError::Status {
            method: "POST".to_string(),
            url: "https://api.test.com/projects".to_string(),
            status: 400,
            body: "invalid name".to_string(),
        };
        assert_eq!(remote.status(), Some(400));

        let err: ExportError = remote.into();
        assert!(matches!(err, ExportError::Remote(_)));
        assert!(err.to_string().contains("status 400"));
    }

    #[test]
    fn test_validation_error_display() {
        let err: ExportError = ValidationError::MissingProject.into();
        assert_eq!(
            err.to_string(),
            "Validation error: project_name or project_id is required"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExportError = json_err.into();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExportError = toml_err.into();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
