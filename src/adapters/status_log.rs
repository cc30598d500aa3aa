//! External status tracker
//!
//! Writes a submission's export outcome into one cell of a spreadsheet-backed
//! tracker. The row is found by the submission's external record id.

use crate::config::{SecretString, StatusLoggerConfig};
use crate::domain::submission::truncate_error_message;
use crate::domain::{ExportError, RemoteError, RemoteResult, Result, SubmissionData};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RowUpdate<'a> {
    id_column_label: &'a str,
    id: &'a str,
    updates: BTreeMap<&'a str, &'a str>,
}

/// Client for the status tracker
pub struct StatusLogger {
    endpoint: String,
    api_key: SecretString,
    http: Client,
    body_limit: usize,
}

impl StatusLogger {
    /// Create a status logger; rejection bodies are kept to `body_limit`
    /// characters
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StatusLoggerConfig, timeout: Duration, body_limit: usize) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()
            .map_err(|e| ExportError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
            body_limit,
        })
    }

    /// Record `status` against the submission's tracker row
    ///
    /// Submissions without a `logger` block are skipped. Any non-2xx answer is
    /// an error; the caller decides whether it blocks the submission.
    pub async fn log(&self, status: &str, submission: &SubmissionData) -> RemoteResult<()> {
        let (Some(target), Some(external_id)) =
            (&submission.status_log, submission.external_id.as_deref())
        else {
            return Ok(());
        };

        let url = format!(
            "{}/rows/{}/worksheets/{}",
            self.endpoint,
            urlencode(&target.spreadsheet_id),
            urlencode(&target.worksheet_title)
        );

        let mut updates = BTreeMap::new();
        updates.insert(target.status_column_label.as_str(), status);
        let body = RowUpdate {
            id_column_label: &target.id_column_label,
            id: external_id,
            updates,
        };

        tracing::debug!(url = %url, id = external_id, status, "Updating status tracker");

        let key = self.api_key.expose_secret();
        let response = self
            .http
            .patch(&url)
            .header("x-apikey", key.as_ref())
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport {
                method: "PATCH".to_string(),
                url: url.clone(),
                message: e.to_string(),
            })?;

        let code = response.status();
        if code.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!(url = %url, status = code.as_u16(), "Status tracker rejected update");
        Err(RemoteError::Status {
            method: "PATCH".to_string(),
            url,
            status: code.as_u16(),
            body: truncate_error_message(&text, self.body_limit),
        })
    }
}

fn urlencode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use mockito::Matcher;
    use serde_json::json;

    fn logger(endpoint: &str) -> StatusLogger {
        StatusLogger::new(
            &StatusLoggerConfig {
                endpoint: endpoint.to_string(),
                api_key: secret_string("tracker-key".to_string()),
            },
            Duration::from_secs(5),
            500,
        )
        .unwrap()
    }

    fn logged_submission() -> SubmissionData {
        SubmissionData::from_json(&json!({
            "project_name": "123 Market St.",
            "_id": "abc123",
            "logger": {
                "spreadsheet_id": "sheet1",
                "worksheet_title": "Permit Status",
                "id_column_label": "ID",
                "status_column_label": "BLUEBEAM_UPLOAD_STATUS"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_log_patches_tracker_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rows/sheet1/worksheets/Permit%20Status")
            .match_header("x-apikey", "tracker-key")
            .match_body(Matcher::Json(json!({
                "id_column_label": "ID",
                "id": "abc123",
                "updates": {"BLUEBEAM_UPLOAD_STATUS": "123-456-789"}
            })))
            .with_status(200)
            .create_async()
            .await;

        logger(&server.url())
            .log("123-456-789", &logged_submission())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_log_raises_on_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = logger(&server.url())
            .log("ERR_UPLOAD_FAIL", &logged_submission())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_rejection_body_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", Matcher::Any)
            .with_status(502)
            .with_body("x".repeat(5000))
            .create_async()
            .await;

        let err = logger(&server.url())
            .log("ERR_UPLOAD_FAIL", &logged_submission())
            .await
            .unwrap_err();
        match err {
            RemoteError::Status { body, .. } => assert_eq!(body.chars().count(), 500),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_log_skips_submission_without_target() {
        let data = SubmissionData::from_json(&json!({"project_name": "x"})).unwrap();
        // Unroutable endpoint: any request would fail
        logger("http://127.0.0.1:9").log("ok", &data).await.unwrap();
    }
}
