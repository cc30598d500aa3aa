//! Domain models and types for the permit exporter.
//!
//! This module contains the core domain models, identifiers and error types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SubmissionId`], [`ProjectId`], [`FolderId`], [`BatchId`])
//! - **Domain models** ([`Submission`], [`ExportBatch`], [`Credential`], [`FolderNode`], [`User`])
//! - **Error types** ([`ExportError`], [`RemoteError`], [`ValidationError`], [`WorkflowFatal`])
//! - **Result type alias** ([`Result`])
//!
//! # Validation boundary
//!
//! Raw submission payloads are validated once, by [`SubmissionData::from_json`]:
//!
//! ```rust
//! use permit_export::domain::{SubmissionData, ValidationError};
//! use serde_json::json;
//!
//! let err = SubmissionData::from_json(&json!({"files": []})).unwrap_err();
//! assert_eq!(err, ValidationError::MissingProject);
//! ```

pub mod credential;
pub mod errors;
pub mod export_batch;
pub mod folder;
pub mod ids;
pub mod result;
pub mod submission;
pub mod user;

// Re-export commonly used types for convenience
pub use credential::{Credential, StoredCredential, TokenResponse};
pub use errors::{CredentialError, ExportError, RemoteError, ValidationError, WorkflowFatal};
pub use export_batch::{ExportBatch, ExportFailure, ExportResult, ExportStatusView, ExportSuccess};
pub use folder::{default_folder_tree, FolderNode, ProjectFolder};
pub use ids::{format_project_id, BatchId, FileId, FolderId, ProjectId, ProjectUserId, SubmissionId};
pub use result::{RemoteResult, Result};
pub use submission::{
    truncate_error_message, FileRef, StatusLogTarget, Submission, SubmissionData,
};
pub use user::User;
