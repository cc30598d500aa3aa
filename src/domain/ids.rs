//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow between the local database
//! and the document service, so a folder id can never be passed where a file
//! id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Local submission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(i64);

impl SubmissionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| format!("Invalid submission id: {s}"))
    }
}

/// Document service project identifier
///
/// Projects are addressed by a dashed nine-digit string such as `123-456-789`.
///
/// # Examples
///
/// ```
/// use permit_export::domain::ids::ProjectId;
///
/// let id = ProjectId::new("123456789").unwrap();
/// assert_eq!(id.as_str(), "123-456-789");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a new ProjectId, normalising bare nine-digit ids
    ///
    /// # Returns
    ///
    /// Returns `Ok(ProjectId)` if the ID is non-empty and made only of ASCII
    /// letters, digits and dashes, `Err` otherwise. The id is placed in
    /// request paths as is.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Project ID cannot be empty".to_string());
        }
        if !trimmed.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(format!("Invalid project ID: {trimmed}"));
        }
        Ok(Self(format_project_id(trimmed)))
    }

    /// Returns the project ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reformats a bare nine-digit project id as `NNN-NNN-NNN`
///
/// Any other input is returned unchanged.
pub fn format_project_id(id: &str) -> String {
    if id.len() == 9 && id.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &id[0..3], &id[3..6], &id[6..9])
    } else {
        id.to_string()
    }
}

/// Document service folder identifier
///
/// The root of a project is addressed with parent id `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(i64);

impl FolderId {
    /// Parent id used when creating top-level folders
    pub const ROOT: FolderId = FolderId(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document service file identifier, returned by upload initiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(i64);

impl FileId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document service project member identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectUserId(i64);

impl ProjectUserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProjectUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Export batch identifier
///
/// # Examples
///
/// ```
/// use permit_export::domain::ids::BatchId;
/// use std::str::FromStr;
///
/// let id = BatchId::from_str("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
/// assert_eq!(id.to_string(), "7d44b88c-4199-4bad-97dc-d78268e01398");
/// assert!(BatchId::from_str("not-a-uuid").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Generates a fresh random batch id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid batch id '{s}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("123456789", "123-456-789" ; "bare digits are dashed")]
    #[test_case("123-456-789", "123-456-789" ; "already dashed")]
    #[test_case("12345678", "12345678" ; "too short")]
    #[test_case("12345678a", "12345678a" ; "non digit")]
    #[test_case("1234567890", "1234567890" ; "too long")]
    fn test_format_project_id(input: &str, expected: &str) {
        assert_eq!(format_project_id(input), expected);
    }

    #[test]
    fn test_project_id_rejects_empty() {
        assert!(ProjectId::new("").is_err());
        assert!(ProjectId::new("   ").is_err());
    }

    #[test_case("1/../x" ; "path traversal")]
    #[test_case("1?y=2" ; "query string")]
    #[test_case("123 456" ; "inner space")]
    #[test_case("12%2F3" ; "percent encoding")]
    fn test_project_id_rejects_unsafe_characters(input: &str) {
        assert!(ProjectId::new(input).is_err());
    }

    #[test]
    fn test_project_id_trims_and_formats() {
        let id = ProjectId::new(" 234097916 ").unwrap();
        assert_eq!(id.as_str(), "234-097-916");
        assert_eq!(id.to_string(), "234-097-916");
    }

    #[test]
    fn test_submission_id_parse() {
        let id: SubmissionId = "42".parse().unwrap();
        assert_eq!(id.value(), 42);
        assert!("abc".parse::<SubmissionId>().is_err());
    }

    #[test]
    fn test_batch_id_roundtrip_through_string() {
        let id = BatchId::generate();
        let parsed: BatchId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_folder_root_is_zero() {
        assert_eq!(FolderId::ROOT.value(), 0);
    }
}
