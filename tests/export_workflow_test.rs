//! End-to-end export scenarios against a mocked document service
//!
//! Each test runs a real batch through `ExportCoordinator` with the
//! in-memory store, the HTTP client pointed at a mockito server and a stored,
//! unexpired credential.

use chrono::{Duration, Utc};
use mockito::{Matcher, Mock, Server, ServerGuard};
use permit_export::adapters::bluebeam::BluebeamClient;
use permit_export::adapters::database::{ExportStore, MemoryStore};
use permit_export::config::{parse_config, secret_string, PermitExportConfig};
use permit_export::core::credentials::{CredentialStore, TokenCipher};
use permit_export::core::export::{ExportCoordinator, ExportService};
use permit_export::domain::ids::SubmissionId;
use permit_export::domain::Credential;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

const PROJECT: &str = "123-456-789";
const TOKEN: &str = "access-token";

struct Harness {
    store: Arc<MemoryStore>,
    service: ExportService,
    coordinator: ExportCoordinator,
}

fn config(server: &ServerGuard, extra: &str) -> PermitExportConfig {
    let toml = format!(
        r#"
database_target = "memory"

[bluebeam]
api_base_url = "{url}"
auth_server = "{url}"
client_id = "client"
client_secret = "secret"
timeout_seconds = 5
connect_timeout_seconds = 5

[credentials]
encryption_key = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4="

[export]
error_message_max_length = 255

[logging]
local_enabled = false
{extra}
"#,
        url = server.url()
    );
    parse_config(&toml).unwrap()
}

async fn harness(server: &ServerGuard) -> Harness {
    harness_with(server, "").await
}

async fn harness_with(server: &ServerGuard, extra: &str) -> Harness {
    let config = config(server, extra);
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(BluebeamClient::new(&config.bluebeam, 500).unwrap());
    let cipher = TokenCipher::new(&config.credentials.encryption_key).unwrap();
    let credentials = Arc::new(CredentialStore::new(store.clone(), client.clone(), cipher));

    credentials
        .save_credential(&Credential {
            access_token: secret_string(TOKEN.to_string()),
            refresh_token: Some(secret_string("refresh".to_string())),
            expires_at: Utc::now() + Duration::hours(1),
            user_name: Some("permits@sfgov.org".to_string()),
            scope: Some("full_user".to_string()),
        })
        .await
        .unwrap();

    let coordinator =
        ExportCoordinator::new(&config, store.clone(), client, credentials.clone()).unwrap();
    let service = ExportService::new(store.clone(), credentials);

    Harness {
        store,
        service,
        coordinator,
    }
}

fn bearer() -> Matcher {
    Matcher::Exact(format!("Bearer {TOKEN}"))
}

async fn folder_mock(server: &mut ServerGuard, name: &str, parent: i64, id: i64) -> Mock {
    server
        .mock("POST", format!("/projects/{PROJECT}/folders").as_str())
        .match_header("authorization", bearer())
        .match_body(Matcher::PartialJson(json!({"Name": name, "ParentFolderId": parent})))
        .with_status(200)
        .with_body(json!({"Id": id}).to_string())
        .expect(1)
        .create_async()
        .await
}

/// Project creation plus the seven folders of the standard tree
async fn new_project_mocks(server: &mut ServerGuard) -> Vec<Mock> {
    let mut mocks = vec![
        server
            .mock("POST", "/projects")
            .match_header("authorization", bearer())
            .match_body(Matcher::PartialJson(
                json!({"Name": "123 Market St. - 202001011234", "Restricted": true}),
            ))
            .with_status(200)
            .with_body(json!({"Id": PROJECT}).to_string())
            .expect(1)
            .create_async()
            .await,
    ];

    for (name, parent, id) in [
        ("CCSF EPR", 0, 101),
        ("A.PERMIT SUBMITTAL", 101, 102),
        ("1.PERMIT FORMS", 102, 103),
        ("2.ROUTING FORMS", 102, 104),
        ("3.DOCUMENTS FOR REVIEW", 102, 105),
        ("B.APPROVED DOCUMENTS", 101, 106),
        ("1.BUILDING PERMIT DOCUMENTS", 106, 107),
    ] {
        mocks.push(folder_mock(server, name, parent, id).await);
    }

    // Dated submittal folder below the upload folder
    mocks.push(
        server
            .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
            .with_status(200)
            .with_body(json!({"ProjectFolders": []}).to_string())
            .create_async()
            .await,
    );
    mocks.push(
        server
            .mock("POST", format!("/projects/{PROJECT}/folders").as_str())
            .match_body(Matcher::PartialJson(json!({"ParentFolderId": 105})))
            .with_status(200)
            .with_body(json!({"Id": 500}).to_string())
            .expect(1)
            .create_async()
            .await,
    );
    mocks
}

fn new_project_payload(server: &ServerGuard) -> Value {
    json!({
        "project_name": "123 Market St.",
        "building_permit_number": "202001011234",
        "files": [{"url": format!("{}/files/plan.pdf", server.url()), "originalName": "plan.pdf"}]
    })
}

#[tokio::test]
async fn test_new_project_is_provisioned_uploaded_and_shared() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;
    h.service.add_user("Reviewer@SFGov.org").await.unwrap();

    let project_mocks = new_project_mocks(&mut server).await;
    let download = server
        .mock("GET", "/files/plan.pdf")
        .with_status(200)
        .with_body("%PDF-1.4 plan")
        .expect(1)
        .create_async()
        .await;
    let initiate = server
        .mock("POST", format!("/projects/{PROJECT}/files").as_str())
        .match_body(Matcher::PartialJson(json!({"Name": "plan.pdf", "ParentFolderId": 500})))
        .with_status(200)
        .with_body(
            json!({
                "Id": 900,
                "UploadUrl": format!("{}/upload/900", server.url()),
                "UploadContentType": "application/pdf"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/upload/900")
        .match_header("x-amz-server-side-encryption", "AES256")
        .match_header("content-type", "application/pdf")
        .match_body("%PDF-1.4 plan")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let confirm = server
        .mock("POST", format!("/projects/{PROJECT}/files/900/confirm-upload").as_str())
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let invite = server
        .mock("POST", format!("/projects/{PROJECT}/users").as_str())
        .match_body(Matcher::PartialJson(json!({"Email": "reviewer@sfgov.org"})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;
    let members = server
        .mock("GET", format!("/projects/{PROJECT}/users").as_str())
        .with_status(200)
        .with_body(json!({"ProjectUsers": [{"Id": 77, "Email": "Reviewer@sfgov.org"}]}).to_string())
        .create_async()
        .await;
    let grant = server
        .mock("PUT", format!("/projects/{PROJECT}/users/77/permissions").as_str())
        .match_body(Matcher::Json(json!({"Type": "FullControl", "Allow": "Allow"})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let submission = h
        .service
        .create_submission(new_project_payload(&server), None)
        .await
        .unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.successful_exports(), 1);
    assert_eq!(summary.failed_exports(), 0);
    for mock in project_mocks {
        mock.assert_async().await;
    }
    download.assert_async().await;
    initiate.assert_async().await;
    put.assert_async().await;
    confirm.assert_async().await;
    invite.assert_async().await;
    members.assert_async().await;
    grant.assert_async().await;

    let stored = h.store.get_submission(submission.id).await.unwrap().unwrap();
    assert!(stored.date_exported.is_some());
    assert_eq!(stored.project_id.as_ref().map(|p| p.as_str()), Some(PROJECT));
    assert_eq!(stored.export_id, Some(batch.id));
    assert!(stored.error_message.is_none());

    let view = h.service.export_status(&batch.id.to_string()).await.unwrap();
    assert!(view.is_finished);
    assert_eq!(view.success.len(), 1);
    assert_eq!(view.success[0].project_id.as_str(), PROJECT);
}

#[tokio::test]
async fn test_resubmission_to_unknown_project_fails_without_creating() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;

    let probe = server
        .mock("GET", "/projects/999-999-999")
        .match_header("authorization", bearer())
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/projects")
        .expect(0)
        .create_async()
        .await;

    let payload = json!({"project_id": "999999999", "files": []});
    let submission = h.service.create_submission(payload.clone(), None).await.unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.successful_exports(), 0);
    assert_eq!(summary.failed_exports(), 1);
    probe.assert_async().await;
    create.assert_async().await;

    let failure = &summary.result.failure[0];
    assert_eq!(failure.err, "ERR_INVALID_PROJECT_ID");
    assert_eq!(failure.data, payload);

    let stored = h.store.get_submission(submission.id).await.unwrap().unwrap();
    assert!(stored.date_exported.is_none());
    assert_eq!(stored.error_message.as_deref(), Some("ERR_INVALID_PROJECT_ID"));
}

#[tokio::test]
async fn test_failed_upload_deletes_new_project() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;

    let _project_mocks = new_project_mocks(&mut server).await;
    let download = server
        .mock("GET", "/files/plan.pdf")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", format!("/projects/{PROJECT}").as_str())
        .match_header("authorization", bearer())
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let submission = h
        .service
        .create_submission(new_project_payload(&server), None)
        .await
        .unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.failed_exports(), 1);
    assert_eq!(summary.result.failure[0].err, "ERR_UPLOAD_FAIL");
    download.assert_async().await;
    delete.assert_async().await;

    let stored = h.store.get_submission(submission.id).await.unwrap().unwrap();
    assert!(stored.date_exported.is_none());
    assert!(stored.project_id.is_none());
    assert_eq!(stored.error_message.as_deref(), Some("ERR_UPLOAD_FAIL"));

    // Failed submissions stay pending for the next batch
    assert_eq!(h.store.count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn test_long_error_is_truncated_only_in_storage() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;

    let create = server
        .mock("POST", "/projects")
        .with_status(500)
        .with_body("x".repeat(1000))
        .expect(1)
        .create_async()
        .await;

    let submission = h
        .service
        .create_submission(json!({"project_name": "1 Main St."}), None)
        .await
        .unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();
    create.assert_async().await;

    let full = &summary.result.failure[0].err;
    assert!(full.chars().count() > 255);

    let stored = h.store.get_submission(submission.id).await.unwrap().unwrap();
    let message = stored.error_message.unwrap();
    assert_eq!(message.chars().count(), 255);
    assert!(full.starts_with(&message));
}

#[tokio::test]
async fn test_one_failure_does_not_stop_the_batch() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;

    let _missing = server
        .mock("GET", "/projects/999-999-999")
        .with_status(404)
        .create_async()
        .await;
    let _exists = server
        .mock("GET", format!("/projects/{PROJECT}").as_str())
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    h.service
        .create_submission(json!({"project_id": "999999999"}), None)
        .await
        .unwrap();
    let ok = h
        .service
        .create_submission(json!({"project_id": PROJECT}), None)
        .await
        .unwrap();

    // The upload folder is only looked up; with no files nothing is uploaded
    let _folders = server
        .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
        .with_status(200)
        .with_body(
            json!({"ProjectFolders": [
                {"Id": 105, "Name": "3.DOCUMENTS FOR REVIEW", "ParentFolderId": 102}
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let batch = h.service.create_export_record(None).await.unwrap();
    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.successful_exports(), 1);
    assert_eq!(summary.failed_exports(), 1);
    assert_eq!(summary.result.success[0].id, ok.id);
    assert_eq!(h.store.count_pending().await.unwrap(), 1);
}

fn pdf_archive() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, body) in [
        ("sheets/A-101.pdf", "%PDF-1.4 a"),
        ("sheets/A-102.pdf", "%PDF-1.4 b"),
        ("notes.txt", "not a drawing"),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_archive_uploads_only_contained_pdfs() {
    let mut server = Server::new_async().await;
    let h = harness(&server).await;

    let _project_mocks = new_project_mocks(&mut server).await;
    let _download = server
        .mock("GET", "/files/plans.zip")
        .with_status(200)
        .with_body(pdf_archive())
        .create_async()
        .await;
    let initiate = server
        .mock("POST", format!("/projects/{PROJECT}/files").as_str())
        .match_body(Matcher::Regex(r#""Name":"A-10[12]\.pdf""#.to_string()))
        .with_status(200)
        .with_body(
            json!({
                "Id": 900,
                "UploadUrl": format!("{}/upload/900", server.url()),
                "UploadContentType": "application/pdf"
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/upload/900")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;
    let confirm = server
        .mock("POST", format!("/projects/{PROJECT}/files/900/confirm-upload").as_str())
        .with_status(204)
        .expect(2)
        .create_async()
        .await;

    h.service
        .create_submission(
            json!({
                "project_name": "123 Market St.",
                "building_permit_number": "202001011234",
                "files": [{"url": format!("{}/files/plans.zip", server.url()), "originalName": "plans.zip"}]
            }),
            None,
        )
        .await
        .unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.successful_exports(), 1);
    assert_eq!(summary.failed_exports(), 0);
    initiate.assert_async().await;
    put.assert_async().await;
    confirm.assert_async().await;
}

#[tokio::test]
async fn test_tracker_failure_blocks_success_but_not_failure() {
    let mut server = Server::new_async().await;
    let extra = format!(
        "\n[status_log]\nendpoint = \"{}/tracker\"\napi_key = \"tracker-key\"\n",
        server.url()
    );
    let h = harness_with(&server, &extra).await;

    let logger = json!({
        "spreadsheet_id": "sheet1",
        "worksheet_title": "Permit Status",
        "id_column_label": "ID",
        "status_column_label": "BLUEBEAM_UPLOAD_STATUS"
    });

    let _exists = server
        .mock("GET", format!("/projects/{PROJECT}").as_str())
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/projects/999-999-999")
        .with_status(404)
        .create_async()
        .await;
    let _folders = server
        .mock("GET", format!("/projects/{PROJECT}/folders").as_str())
        .with_status(200)
        .with_body(
            json!({"ProjectFolders": [
                {"Id": 105, "Name": "3.DOCUMENTS FOR REVIEW", "ParentFolderId": 102}
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let tracker_success = server
        .mock("PATCH", "/tracker/rows/sheet1/worksheets/Permit%20Status")
        .match_header("x-apikey", "tracker-key")
        .match_body(Matcher::PartialJson(
            json!({"id": "rec-ok", "updates": {"BLUEBEAM_UPLOAD_STATUS": PROJECT}}),
        ))
        .with_status(500)
        .with_body("tracker down")
        .expect(1)
        .create_async()
        .await;
    let tracker_failures = server
        .mock("PATCH", "/tracker/rows/sheet1/worksheets/Permit%20Status")
        .match_body(Matcher::Regex("ERR_|status 500".to_string()))
        .with_status(500)
        .with_body("tracker down")
        .expect(2)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let logged = h
        .service
        .create_submission(
            json!({"project_id": PROJECT, "_id": "rec-ok", "logger": logger.clone()}),
            None,
        )
        .await
        .unwrap();
    let invalid = h
        .service
        .create_submission(
            json!({"project_id": "999999999", "_id": "rec-bad", "logger": logger}),
            None,
        )
        .await
        .unwrap();
    let batch = h.service.create_export_record(None).await.unwrap();

    let summary = h.coordinator.start_export(batch.id).await.unwrap();

    assert_eq!(summary.successful_exports(), 0);
    assert_eq!(summary.failed_exports(), 2);
    tracker_success.assert_async().await;
    tracker_failures.assert_async().await;
    delete.assert_async().await;

    let err_for = |id: SubmissionId| {
        summary
            .result
            .failure
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.err.clone())
            .unwrap()
    };
    // A rejected success report fails the submission
    let logged_err = err_for(logged.id);
    assert!(logged_err.starts_with("PATCH"), "{logged_err}");
    assert!(logged_err.contains("status 500"), "{logged_err}");
    // A rejected failure report leaves the original error in place
    assert_eq!(err_for(invalid.id), "ERR_INVALID_PROJECT_ID");

    let stored = h.store.get_submission(logged.id).await.unwrap().unwrap();
    assert!(stored.date_exported.is_none());
}
