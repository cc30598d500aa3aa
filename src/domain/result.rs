//! Result type alias for the exporter
//!
//! This module provides a convenient Result type alias that uses ExportError
//! as the error type, plus a narrower alias for remote calls.

use super::errors::{ExportError, RemoteError};

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use permit_export::domain::result::Result;
/// use permit_export::domain::errors::ExportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExportError::Other("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;

/// Result of a single remote HTTP call
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
