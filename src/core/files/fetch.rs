//! File retrieval
//!
//! Downloads a submission's file into a fresh temporary directory. Files on
//! the internal object storage are fetched through its proxy with an API key;
//! everything else is a plain GET.

use crate::config::{SecretString, StorageConfig};
use crate::domain::{ExportError, FileRef, RemoteError, Result};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A downloaded file and the directory that owns it
///
/// The directory and everything in it is removed when this value is dropped.
#[derive(Debug)]
pub struct FetchedFile {
    dir: TempDir,
    path: PathBuf,
}

impl FetchedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

struct ObjectStorage {
    domain: String,
    proxy_url: String,
    api_key: SecretString,
}

/// Downloads submission files
pub struct FileFetcher {
    http: Client,
    storage: Option<ObjectStorage>,
}

impl FileFetcher {
    /// Create a fetcher
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(storage: &StorageConfig, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ExportError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let storage = match (&storage.domain, &storage.proxy_url, &storage.api_key) {
            (Some(domain), Some(proxy_url), Some(api_key)) => Some(ObjectStorage {
                domain: domain.to_lowercase(),
                proxy_url: proxy_url.clone(),
                api_key: api_key.clone(),
            }),
            _ => None,
        };

        Ok(Self { http, storage })
    }

    /// Download a file into a new temporary directory, named after its
    /// original filename
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the download fails or the file
    /// cannot be written.
    pub async fn fetch(&self, file: &FileRef) -> Result<FetchedFile> {
        let url = url::Url::parse(&file.url).map_err(|e| RemoteError::InvalidResponse {
            url: file.url.clone(),
            message: format!("invalid file url: {e}"),
        })?;

        let request = match self.proxy_for(&url) {
            Some(storage) => {
                let key = url.path().trim_start_matches('/').to_string();
                tracing::debug!(object = %key, "Fetching file through object storage proxy");
                let api_key = storage.api_key.expose_secret();
                self.http
                    .get(&storage.proxy_url)
                    .query(&[("name", key.as_str())])
                    .header("x-apikey", api_key.as_ref())
            }
            None => self.http.get(url.as_str()),
        };

        let response = request.send().await.map_err(|e| RemoteError::Transport {
            method: "GET".to_string(),
            url: file.url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                method: "GET".to_string(),
                url: file.url.clone(),
                status: status.as_u16(),
                body: String::new(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| RemoteError::Transport {
            method: "GET".to_string(),
            url: file.url.clone(),
            message: e.to_string(),
        })?;

        let dir = TempDir::new()?;
        let path = dir.path().join(local_name(&file.original_name));
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(url = %file.url, bytes = bytes.len(), path = %path.display(), "Downloaded file");
        Ok(FetchedFile { dir, path })
    }

    fn proxy_for(&self, url: &url::Url) -> Option<&ObjectStorage> {
        let storage = self.storage.as_ref()?;
        let host = url.host_str()?.to_lowercase();
        host.ends_with(&storage.domain).then_some(storage)
    }
}

/// Last path component of the original name, so it cannot escape the
/// temporary directory
fn local_name(original: &str) -> String {
    original
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .unwrap_or("download")
        .to_string()
}
