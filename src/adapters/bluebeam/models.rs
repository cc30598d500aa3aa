//! Document service wire models
//!
//! Request and response bodies as the REST API spells them (PascalCase).

use crate::domain::ids::{FileId, FolderId, ProjectUserId};
use crate::domain::ProjectFolder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProjectRequest<'a> {
    pub name: &'a str,
    pub notification: bool,
    pub restricted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProjectResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub parent_folder_id: i64,
    pub comment: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IdResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderListResponse {
    #[serde(default)]
    pub project_folders: Vec<FolderEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FolderEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
    #[serde(default)]
    pub path: Option<String>,
}

impl From<FolderEntry> for ProjectFolder {
    fn from(entry: FolderEntry) -> Self {
        ProjectFolder {
            id: FolderId::new(entry.id),
            name: entry.name,
            parent_id: entry.parent_folder_id.map(FolderId::new),
            path: entry.path,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateUploadRequest<'a> {
    pub name: &'a str,
    pub parent_folder_id: i64,
}

/// Upload initiation response
///
/// The API reports some failures (such as an invalid filename) inside a 200
/// response through `ErrorCode`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateUploadResponse {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub upload_content_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where and how to send a file's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub file_id: FileId,
    pub upload_url: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddUserRequest<'a> {
    pub email: &'a str,
    pub send_email: bool,
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectUsersResponse {
    #[serde(default)]
    pub project_users: Vec<ProjectUserEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectUserEntry {
    pub id: i64,
    pub email: String,
}

/// A member of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUser {
    pub id: ProjectUserId,
    pub email: String,
}

impl From<ProjectUserEntry> for ProjectUser {
    fn from(entry: ProjectUserEntry) -> Self {
        ProjectUser {
            id: ProjectUserId::new(entry.id),
            email: entry.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionRequest<'a> {
    #[serde(rename = "Type")]
    pub kind: &'a str,
    pub allow: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_bodies_use_pascal_case() {
        let body = serde_json::to_value(CreateFolderRequest {
            name: "CCSF EPR",
            parent_folder_id: 0,
            comment: "",
        })
        .unwrap();
        assert_eq!(body, json!({"Name": "CCSF EPR", "ParentFolderId": 0, "Comment": ""}));

        let body = serde_json::to_value(PermissionRequest {
            kind: "FullControl",
            allow: "Allow",
        })
        .unwrap();
        assert_eq!(body, json!({"Type": "FullControl", "Allow": "Allow"}));
    }

    #[test]
    fn test_folder_list_parses() {
        let parsed: FolderListResponse = serde_json::from_value(json!({
            "$id": "1",
            "ProjectFolders": [{
                "$id": "2",
                "Id": 135399569,
                "Name": "3.DOCUMENTS FOR REVIEW",
                "Path": "/CCSF EPR/A.PERMIT SUBMITTAL/3.DOCUMENTS FOR REVIEW",
                "ParentFolderId": 135399567,
                "Permission": "ReadWriteDelete"
            }],
            "TotalCount": 1
        }))
        .unwrap();

        let folder: ProjectFolder = parsed.project_folders.into_iter().next().unwrap().into();
        assert_eq!(folder.id, FolderId::new(135399569));
        assert_eq!(folder.parent_id, Some(FolderId::new(135399567)));
    }

    #[test]
    fn test_upload_error_code_parses() {
        let parsed: InitiateUploadResponse = serde_json::from_value(json!({
            "ErrorCode": 11,
            "Message": "Invalid file name"
        }))
        .unwrap();
        assert_eq!(parsed.error_code, Some(11));
        assert!(parsed.upload_url.is_none());
    }
}
