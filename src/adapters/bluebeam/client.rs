//! Bluebeam Studio REST client
//!
//! Implements [`DocumentService`] over `reqwest`. Every call is audit-logged
//! with its method, URL, status and bodies truncated to the configured limit.
//! Token grant bodies are never logged.

use super::models::{
    AddUserRequest, CreateFolderRequest, CreateProjectRequest, CreateProjectResponse,
    FolderListResponse, IdResponse, InitiateUploadRequest, InitiateUploadResponse,
    PermissionRequest, ProjectUser, ProjectUsersResponse, UploadTicket,
};
use super::service::DocumentService;
use crate::config::{BluebeamConfig, SecretString};
use crate::domain::ids::{FileId, FolderId, ProjectId, ProjectUserId};
use crate::domain::{
    truncate_error_message, Credential, ExportError, ProjectFolder, RemoteError, RemoteResult,
    Result, TokenResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

const AUTHORIZE_PATH: &str = "/auth/oauth/authorize";
const TOKEN_PATH: &str = "/auth/token";
const SCOPE: &str = "full_user";

/// How much of a call to write to the audit log
#[derive(Clone, Copy, PartialEq, Eq)]
enum Audit {
    Full,
    /// Bodies carry secrets (token grants)
    Redacted,
}

/// Document service client for Bluebeam Studio
///
/// # Example
///
/// ```no_run
/// use permit_export::adapters::bluebeam::{BluebeamClient, DocumentService};
/// use permit_export::config::load_config;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config("permit-export.toml")?;
/// let client = BluebeamClient::new(&config.bluebeam, config.export.audit_body_limit)?;
///
/// println!("Visit {}", client.authorization_url("https://localhost/callback")?);
/// # Ok(())
/// # }
/// ```
pub struct BluebeamClient {
    api_base_url: String,
    auth_server: String,
    client_id: String,
    client_secret: SecretString,
    invite_message: String,
    audit_body_limit: usize,
    http: Client,
}

impl BluebeamClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BluebeamConfig, audit_body_limit: usize) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(|e| ExportError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_server: config.auth_server.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            invite_message: config.invite_message.clone(),
            audit_body_limit,
            http,
        })
    }

    /// URL an operator visits to grant the exporter access
    ///
    /// # Errors
    ///
    /// Returns an error if the configured auth server is not a valid URL.
    pub fn authorization_url(&self, redirect_uri: &str) -> Result<String> {
        let url = url::Url::parse_with_params(
            &format!("{}{}", self.auth_server, AUTHORIZE_PATH),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPE),
            ],
        )
        .map_err(|e| ExportError::Configuration(format!("Invalid auth server URL: {e}")))?;
        Ok(url.into())
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn audit_text(&self, body: &str) -> String {
        truncate_error_message(body, self.audit_body_limit)
    }

    /// Sends a request and returns its status and body text
    ///
    /// Only transport failures are errors here; callers decide what a status
    /// means.
    async fn send(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
        request_body: Option<&str>,
        audit: Audit,
    ) -> RemoteResult<(StatusCode, String)> {
        let logged_request = match (audit, request_body) {
            (Audit::Redacted, _) => "[REDACTED]".to_string(),
            (Audit::Full, Some(body)) => self.audit_text(body),
            (Audit::Full, None) => String::new(),
        };
        tracing::debug!(method, url, request = %logged_request, "Document service request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method, url, error = %e, "Document service request failed");
            RemoteError::Transport {
                method: method.to_string(),
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RemoteError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;

        let logged_response = match audit {
            Audit::Redacted => "[REDACTED]".to_string(),
            Audit::Full => self.audit_text(&body),
        };
        tracing::debug!(
            method,
            url,
            status = status.as_u16(),
            response = %logged_response,
            "Document service response"
        );

        Ok((status, body))
    }

    /// Like [`send`](Self::send) but turns any non-2xx status into an error
    async fn send_ok(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
        request_body: Option<&str>,
        audit: Audit,
    ) -> RemoteResult<String> {
        let (status, body) = self.send(method, url, request, request_body, audit).await?;
        if status.is_success() {
            return Ok(body);
        }

        tracing::warn!(method, url, status = status.as_u16(), "Document service rejected request");
        Err(RemoteError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            body: match audit {
                Audit::Redacted => self.audit_text(&redact_token_fields(&body)),
                Audit::Full => self.audit_text(&body),
            },
        })
    }

    async fn send_json<B: serde::Serialize + Sync>(
        &self,
        method: reqwest::Method,
        url: &str,
        token: &str,
        body: &B,
    ) -> RemoteResult<String> {
        let payload = serde_json::to_string(body).map_err(|e| RemoteError::InvalidResponse {
            url: url.to_string(),
            message: format!("failed to encode request: {e}"),
        })?;
        let request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());

        self.send_ok(method.as_str(), url, request, Some(&payload), Audit::Full)
            .await
    }

    async fn token_grant(&self, form: &[(&str, &str)]) -> RemoteResult<Credential> {
        let url = format!("{}{}", self.auth_server, TOKEN_PATH);
        let secret = self.client_secret.expose_secret();
        let mut params: Vec<(&str, &str)> = form.to_vec();
        params.push(("client_id", self.client_id.as_str()));
        params.push(("client_secret", secret.as_ref()));

        let request = self.http.post(&url).form(&params);
        let body = self
            .send_ok("POST", &url, request, None, Audit::Redacted)
            .await?;

        let token: TokenResponse = parse_json(&url, &body)?;
        Ok(Credential::from_token_response(token, Utc::now()))
    }
}

fn parse_json<T: DeserializeOwned>(url: &str, body: &str) -> RemoteResult<T> {
    serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Keeps only the OAuth error fields of a token endpoint body
fn redact_token_fields(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            let kept: serde_json::Map<String, serde_json::Value> = map
                .into_iter()
                .filter(|(k, _)| k == "error" || k == "error_description")
                .collect();
            serde_json::Value::Object(kept).to_string()
        }
        _ => "[REDACTED]".to_string(),
    }
}

#[async_trait]
impl DocumentService for BluebeamClient {
    async fn create_project(&self, token: &str, name: &str) -> RemoteResult<ProjectId> {
        let url = self.api_url("/projects");
        let body = self
            .send_json(
                reqwest::Method::POST,
                &url,
                token,
                &CreateProjectRequest {
                    name,
                    notification: true,
                    restricted: true,
                },
            )
            .await?;

        let created: CreateProjectResponse = parse_json(&url, &body)?;
        let project_id = ProjectId::new(created.id).map_err(|message| {
            RemoteError::InvalidResponse {
                url: url.clone(),
                message,
            }
        })?;

        tracing::info!(project_id = %project_id, "Created project");
        Ok(project_id)
    }

    async fn delete_project(&self, token: &str, project_id: &ProjectId) -> RemoteResult<()> {
        let url = self.api_url(&format!("/projects/{}", project_id));
        let request = self.http.delete(&url).bearer_auth(token);
        self.send_ok("DELETE", &url, request, None, Audit::Full)
            .await?;
        tracing::info!(project_id = %project_id, "Deleted project");
        Ok(())
    }

    async fn project_exists(&self, token: &str, project_id: &ProjectId) -> RemoteResult<bool> {
        let url = self.api_url(&format!("/projects/{}", project_id));
        let request = self.http.get(&url).bearer_auth(token);
        let (status, _) = self.send("GET", &url, request, None, Audit::Full).await?;
        Ok(status == StatusCode::OK)
    }

    async fn create_folder(
        &self,
        token: &str,
        project_id: &ProjectId,
        name: &str,
        parent: FolderId,
    ) -> RemoteResult<FolderId> {
        let url = self.api_url(&format!("/projects/{}/folders", project_id));
        let body = self
            .send_json(
                reqwest::Method::POST,
                &url,
                token,
                &CreateFolderRequest {
                    name,
                    parent_folder_id: parent.value(),
                    comment: "",
                },
            )
            .await?;

        let created: IdResponse = parse_json(&url, &body)?;
        let folder_id = FolderId::new(created.id);
        tracing::debug!(project_id = %project_id, folder_id = %folder_id, name, "Created folder");
        Ok(folder_id)
    }

    async fn list_folders(
        &self,
        token: &str,
        project_id: &ProjectId,
    ) -> RemoteResult<Vec<ProjectFolder>> {
        let url = self.api_url(&format!("/projects/{}/folders", project_id));
        let request = self.http.get(&url).bearer_auth(token);
        let body = self
            .send_ok("GET", &url, request, None, Audit::Full)
            .await?;

        let listed: FolderListResponse = parse_json(&url, &body)?;
        Ok(listed
            .project_folders
            .into_iter()
            .map(ProjectFolder::from)
            .collect())
    }

    async fn initiate_upload(
        &self,
        token: &str,
        project_id: &ProjectId,
        filename: &str,
        folder: FolderId,
    ) -> RemoteResult<UploadTicket> {
        let url = self.api_url(&format!("/projects/{}/files", project_id));
        let body = self
            .send_json(
                reqwest::Method::POST,
                &url,
                token,
                &InitiateUploadRequest {
                    name: filename,
                    parent_folder_id: folder.value(),
                },
            )
            .await?;

        let initiated: InitiateUploadResponse = parse_json(&url, &body)?;
        if let Some(code) = initiated.error_code {
            return Err(RemoteError::Rejected {
                code,
                message: initiated.message.unwrap_or_default(),
            });
        }

        match (initiated.id, initiated.upload_url) {
            (Some(id), Some(upload_url)) => Ok(UploadTicket {
                file_id: FileId::new(id),
                upload_url,
                content_type: initiated
                    .upload_content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            }),
            _ => Err(RemoteError::InvalidResponse {
                url,
                message: "upload response is missing Id or UploadUrl".to_string(),
            }),
        }
    }

    async fn put_upload(&self, ticket: &UploadTicket, content: Vec<u8>) -> RemoteResult<()> {
        let size = content.len();
        let request = self
            .http
            .put(&ticket.upload_url)
            .header(reqwest::header::CONTENT_TYPE, &ticket.content_type)
            .header("x-amz-server-side-encryption", "AES256")
            .body(content);

        let described = format!("<{size} bytes of {}>", ticket.content_type);
        self.send_ok("PUT", &ticket.upload_url, request, Some(&described), Audit::Full)
            .await?;
        Ok(())
    }

    async fn confirm_upload(
        &self,
        token: &str,
        project_id: &ProjectId,
        file_id: FileId,
    ) -> RemoteResult<bool> {
        let url = self.api_url(&format!(
            "/projects/{}/files/{}/confirm-upload",
            project_id, file_id
        ));
        let request = self.http.post(&url).bearer_auth(token);
        let (status, body) = self.send("POST", &url, request, None, Audit::Full).await?;

        if status == StatusCode::NO_CONTENT {
            return Ok(true);
        }
        if status.is_success() {
            tracing::warn!(file_id = %file_id, status = status.as_u16(), "Upload not confirmed");
            return Ok(false);
        }
        Err(RemoteError::Status {
            method: "POST".to_string(),
            url,
            status: status.as_u16(),
            body: self.audit_text(&body),
        })
    }

    async fn add_project_user(
        &self,
        token: &str,
        project_id: &ProjectId,
        email: &str,
    ) -> RemoteResult<()> {
        let url = self.api_url(&format!("/projects/{}/users", project_id));
        self.send_json(
            reqwest::Method::POST,
            &url,
            token,
            &AddUserRequest {
                email,
                send_email: false,
                message: &self.invite_message,
            },
        )
        .await?;
        Ok(())
    }

    async fn list_project_users(
        &self,
        token: &str,
        project_id: &ProjectId,
    ) -> RemoteResult<Vec<ProjectUser>> {
        let url = self.api_url(&format!("/projects/{}/users", project_id));
        let request = self.http.get(&url).bearer_auth(token);
        let body = self
            .send_ok("GET", &url, request, None, Audit::Full)
            .await?;

        let listed: ProjectUsersResponse = parse_json(&url, &body)?;
        Ok(listed
            .project_users
            .into_iter()
            .map(ProjectUser::from)
            .collect())
    }

    async fn set_full_access(
        &self,
        token: &str,
        project_id: &ProjectId,
        user_id: ProjectUserId,
    ) -> RemoteResult<()> {
        let url = self.api_url(&format!(
            "/projects/{}/users/{}/permissions",
            project_id, user_id
        ));
        self.send_json(
            reqwest::Method::PUT,
            &url,
            token,
            &PermissionRequest {
                kind: "FullControl",
                allow: "Allow",
            },
        )
        .await?;
        Ok(())
    }

    async fn refresh_credential(&self, refresh_token: &str) -> RemoteResult<Credential> {
        let mut credential = self
            .token_grant(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        // Some grants omit a rotated refresh token; the old one stays valid
        if credential.refresh_token.is_none() {
            credential.refresh_token = Some(crate::config::secret_string(refresh_token.to_string()));
        }
        tracing::info!(expires_at = %credential.expires_at, "Refreshed access credential");
        Ok(credential)
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> RemoteResult<Credential> {
        let credential = self
            .token_grant(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .await?;
        tracing::info!(
            user = credential.user_name.as_deref().unwrap_or("unknown"),
            "Exchanged authorization code for credential"
        );
        Ok(credential)
    }
}
