//! Document service capability
//!
//! The orchestrator, the directory provisioner and the credential store talk
//! to the document platform only through this trait.

use super::models::{ProjectUser, UploadTicket};
use crate::domain::ids::{FileId, FolderId, ProjectId, ProjectUserId};
use crate::domain::{Credential, ProjectFolder, RemoteResult};
use async_trait::async_trait;

/// Typed access to the document platform's REST API
///
/// Every call except [`put_upload`](DocumentService::put_upload) and the token
/// grants takes the bearer access token. Any non-2xx status is a
/// [`RemoteError`](crate::domain::RemoteError), except in
/// [`project_exists`](DocumentService::project_exists).
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Create a restricted project and return its id
    async fn create_project(&self, token: &str, name: &str) -> RemoteResult<ProjectId>;

    /// Delete a project
    async fn delete_project(&self, token: &str, project_id: &ProjectId) -> RemoteResult<()>;

    /// Probe a project; any non-200 answer means it does not exist
    async fn project_exists(&self, token: &str, project_id: &ProjectId) -> RemoteResult<bool>;

    /// Create a folder under `parent` ([`FolderId::ROOT`] for top level)
    async fn create_folder(
        &self,
        token: &str,
        project_id: &ProjectId,
        name: &str,
        parent: FolderId,
    ) -> RemoteResult<FolderId>;

    /// List every folder of a project
    async fn list_folders(
        &self,
        token: &str,
        project_id: &ProjectId,
    ) -> RemoteResult<Vec<ProjectFolder>>;

    /// Register a file and obtain its pre-signed upload location
    ///
    /// The filename must already be sanitized.
    async fn initiate_upload(
        &self,
        token: &str,
        project_id: &ProjectId,
        filename: &str,
        folder: FolderId,
    ) -> RemoteResult<UploadTicket>;

    /// Send the file bytes to the pre-signed location
    async fn put_upload(&self, ticket: &UploadTicket, content: Vec<u8>) -> RemoteResult<()>;

    /// Confirm an upload; true only when the platform acknowledges it
    async fn confirm_upload(
        &self,
        token: &str,
        project_id: &ProjectId,
        file_id: FileId,
    ) -> RemoteResult<bool>;

    /// Invite a user to a project by e-mail
    async fn add_project_user(
        &self,
        token: &str,
        project_id: &ProjectId,
        email: &str,
    ) -> RemoteResult<()>;

    /// List project members
    async fn list_project_users(
        &self,
        token: &str,
        project_id: &ProjectId,
    ) -> RemoteResult<Vec<ProjectUser>>;

    /// Grant full control of a project to a member
    async fn set_full_access(
        &self,
        token: &str,
        project_id: &ProjectId,
        user_id: ProjectUserId,
    ) -> RemoteResult<()>;

    /// Exchange a refresh token for a new credential
    async fn refresh_credential(&self, refresh_token: &str) -> RemoteResult<Credential>;

    /// Exchange an authorization code for a credential
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> RemoteResult<Credential>;
}
