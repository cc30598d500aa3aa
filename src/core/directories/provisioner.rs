//! Project folder provisioning
//!
//! Creates the static folder tree in new projects, finds the upload folder of
//! existing projects and maintains the dated submittal folder uploads go into.

use crate::adapters::bluebeam::DocumentService;
use crate::config::DirectoryConfig;
use crate::domain::ids::{FolderId, ProjectId};
use crate::domain::{FolderNode, RemoteResult, Result, WorkflowFatal};
use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Builds and navigates a project's folder hierarchy
pub struct DirectoryProvisioner {
    service: Arc<dyn DocumentService>,
    tree: Vec<FolderNode>,
    submittal_prefix: String,
}

impl DirectoryProvisioner {
    pub fn new(service: Arc<dyn DocumentService>, config: &DirectoryConfig) -> Self {
        Self {
            service,
            tree: config.tree.clone(),
            submittal_prefix: config.submittal_prefix.clone(),
        }
    }

    /// Create the whole folder tree in a new project
    ///
    /// Folders are created parent first. Returns the id of the folder
    /// carrying the upload marker; if several do, the last one finished in
    /// traversal order wins. `None` when no folder is marked.
    pub async fn provision(&self, token: &str, project_id: &ProjectId) -> RemoteResult<Option<FolderId>> {
        let upload_dir = self
            .create_nodes(token, project_id, &self.tree, FolderId::ROOT)
            .await?;

        tracing::debug!(
            project_id = %project_id,
            upload_dir = ?upload_dir,
            "Provisioned project folders"
        );
        Ok(upload_dir)
    }

    fn create_nodes<'a>(
        &'a self,
        token: &'a str,
        project_id: &'a ProjectId,
        nodes: &'a [FolderNode],
        parent: FolderId,
    ) -> BoxFuture<'a, RemoteResult<Option<FolderId>>> {
        async move {
            let mut upload_dir = None;
            for node in nodes {
                let folder_id = self
                    .service
                    .create_folder(token, project_id, &node.name, parent)
                    .await?;

                if let Some(found) = self
                    .create_nodes(token, project_id, &node.subdirs, folder_id)
                    .await?
                {
                    upload_dir = Some(found);
                }
                if node.uploads {
                    upload_dir = Some(folder_id);
                }
            }
            Ok(upload_dir)
        }
        .boxed()
    }

    /// Find the upload folder of an existing project by name
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowFatal::NoUploadDirFound`] if the tree has no upload
    /// folder or the project lacks it.
    pub async fn find_upload_dir(&self, token: &str, project_id: &ProjectId) -> Result<FolderId> {
        let name = FolderNode::upload_folder_name(&self.tree).ok_or(WorkflowFatal::NoUploadDirFound)?;

        let folders = self.service.list_folders(token, project_id).await?;
        let found = folders
            .into_iter()
            .find(|folder| folder.name == name)
            .map(|folder| folder.id)
            .ok_or(WorkflowFatal::NoUploadDirFound)?;

        tracing::debug!(project_id = %project_id, folder_id = %found, "Found upload folder");
        Ok(found)
    }

    /// Name of the submittal folder for `date`
    pub fn submittal_folder_name(&self, date: NaiveDate) -> String {
        format!("{} {}", self.submittal_prefix, date.format("%Y-%m-%d"))
    }

    /// Return the dated submittal folder under `upload_dir`, creating it if
    /// it does not exist yet
    pub async fn ensure_submittal_folder(
        &self,
        token: &str,
        project_id: &ProjectId,
        upload_dir: FolderId,
        date: NaiveDate,
    ) -> RemoteResult<FolderId> {
        let name = self.submittal_folder_name(date);

        let existing = self
            .service
            .list_folders(token, project_id)
            .await?
            .into_iter()
            .find(|folder| folder.parent_id == Some(upload_dir) && folder.name == name);

        if let Some(folder) = existing {
            tracing::debug!(project_id = %project_id, folder_id = %folder.id, name = %name, "Reusing submittal folder");
            return Ok(folder.id);
        }

        let folder_id = self
            .service
            .create_folder(token, project_id, &name, upload_dir)
            .await?;
        tracing::info!(project_id = %project_id, folder_id = %folder_id, name = %name, "Created submittal folder");
        Ok(folder_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bluebeam::BluebeamClient;
    use crate::config::{secret_string, BluebeamConfig};
    use crate::domain::ExportError;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const PROJECT: &str = "123-456-789";

    fn provisioner(server: &Server, tree: Vec<FolderNode>) -> DirectoryProvisioner {
        let client = BluebeamClient::new(
            &BluebeamConfig {
                api_base_url: server.url(),
                auth_server: server.url(),
                client_id: "id".to_string(),
                client_secret: secret_string("secret".to_string()),
                redirect_uri: None,
                timeout_seconds: 5,
                connect_timeout_seconds: 5,
                invite_message: String::new(),
            },
            500,
        )
        .unwrap();

        DirectoryProvisioner::new(
            Arc::new(client),
            &DirectoryConfig {
                tree,
                submittal_prefix: "SUBMITTAL".to_string(),
            },
        )
    }

    fn project() -> ProjectId {
        ProjectId::new(PROJECT).unwrap()
    }

    async fn folder_mock(server: &mut Server, name: &str, parent: i64, id: i64) -> mockito::Mock {
        server
            .mock("POST", format!("/projects/{PROJECT}/folders").as_str())
            .match_body(Matcher::PartialJson(json!({"Name": name, "ParentFolderId": parent})))
            .with_status(200)
            .with_body(json!({"Id": id}).to_string())
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_provision_returns_marked_folder() {
        let mut server = Server::new_async().await;
        let root = folder_mock(&mut server, "root", 0, 10).await;
        let docs = folder_mock(&mut server, "docs", 10, 11).await;
        let other = folder_mock(&mut server, "other", 0, 12).await;

        let tree = vec![
            FolderNode::new("root").with_subdirs(vec![FolderNode::new("docs").upload_target()]),
            FolderNode::new("other"),
        ];
        let result = provisioner(&server, tree).provision("t", &project()).await.unwrap();

        assert_eq!(result, Some(FolderId::new(11)));
        root.assert_async().await;
        docs.assert_async().await;
        other.assert_async().await;
    }

    #[tokio::test]
    async fn test_provision_without_marker_is_none() {
        let mut server = Server::new_async().await;
        let _root = folder_mock(&mut server, "root", 0, 10).await;

        let result = provisioner(&server, vec![FolderNode::new("root")])
            .provision("t", &project())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_provision_last_marker_wins() {
        let mut server = Server::new_async().await;
        let _a = folder_mock(&mut server, "a", 0, 1).await;
        let _b = folder_mock(&mut server, "b", 0, 2).await;

        let tree = vec![
            FolderNode::new("a").upload_target(),
            FolderNode::new("b").upload_target(),
        ];
        let result = provisioner(&server, tree).provision("t", &project()).await.unwrap();
        assert_eq!(result, Some(FolderId::new(2)));
    }

    #[tokio::test]
    async fn test_find_upload_dir() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
            .with_status(200)
            .with_body(
                json!({"ProjectFolders": [
                    {"Id": 1, "Name": "root", "ParentFolderId": 0},
                    {"Id": 2, "Name": "docs", "ParentFolderId": 1}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let tree = vec![FolderNode::new("root").with_subdirs(vec![FolderNode::new("docs").upload_target()])];
        let found = provisioner(&server, tree).find_upload_dir("t", &project()).await.unwrap();
        assert_eq!(found, FolderId::new(2));
    }

    #[tokio::test]
    async fn test_find_upload_dir_missing() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
            .with_status(200)
            .with_body(json!({"ProjectFolders": [{"Id": 1, "Name": "root"}]}).to_string())
            .create_async()
            .await;

        let tree = vec![FolderNode::new("docs").upload_target()];
        let err = provisioner(&server, tree)
            .find_upload_dir("t", &project())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Workflow(WorkflowFatal::NoUploadDirFound)));
    }

    #[tokio::test]
    async fn test_submittal_folder_reused_when_present() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
            .with_status(200)
            .with_body(
                json!({"ProjectFolders": [
                    {"Id": 2, "Name": "docs", "ParentFolderId": 1},
                    {"Id": 5, "Name": "SUBMITTAL 2024-03-01", "ParentFolderId": 3},
                    {"Id": 6, "Name": "SUBMITTAL 2024-03-01", "ParentFolderId": 2}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let create = server
            .mock("POST", format!("/projects/{PROJECT}/folders").as_str())
            .expect(0)
            .create_async()
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let folder = provisioner(&server, vec![])
            .ensure_submittal_folder("t", &project(), FolderId::new(2), date)
            .await
            .unwrap();

        assert_eq!(folder, FolderId::new(6));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_submittal_folder_created_when_absent() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
            .with_status(200)
            .with_body(json!({"ProjectFolders": []}).to_string())
            .create_async()
            .await;
        let create = folder_mock(&mut server, "SUBMITTAL 2024-03-01", 2, 7).await;

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let folder = provisioner(&server, vec![])
            .ensure_submittal_folder("t", &project(), FolderId::new(2), date)
            .await
            .unwrap();

        assert_eq!(folder, FolderId::new(7));
        create.assert_async().await;
    }
}
