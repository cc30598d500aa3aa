//! Integration tests for triggering exports and running them on workers
//!
//! These tests verify that:
//! - Nothing is created without a stored credential
//! - Only one batch runs at a time
//! - Queued batches finish when the pool drains
//! - Shutdown stops idle workers

use chrono::{Duration as ChronoDuration, Utc};
use mockito::{Server, ServerGuard};
use permit_export::adapters::bluebeam::BluebeamClient;
use permit_export::adapters::database::{ExportStore, MemoryStore};
use permit_export::config::{parse_config, secret_string};
use permit_export::core::credentials::{CredentialStore, TokenCipher};
use permit_export::core::export::{ExportCoordinator, ExportService, ExportWorkerPool, TriggerOutcome};
use permit_export::domain::{Credential, CredentialError, ExportBatch, ExportError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct Harness {
    store: Arc<MemoryStore>,
    credentials: Arc<CredentialStore>,
    service: ExportService,
    coordinator: Arc<ExportCoordinator>,
}

fn harness(server: &ServerGuard) -> Harness {
    let config = parse_config(&format!(
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

[logging]
local_enabled = false
"#,
        url = server.url()
    ))
    .unwrap();

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(BluebeamClient::new(&config.bluebeam, 500).unwrap());
    let cipher = TokenCipher::new(&config.credentials.encryption_key).unwrap();
    let credentials = Arc::new(CredentialStore::new(store.clone(), client.clone(), cipher));
    let coordinator = Arc::new(
        ExportCoordinator::new(&config, store.clone(), client, credentials.clone()).unwrap(),
    );
    let service = ExportService::new(store.clone(), credentials.clone());

    Harness {
        store,
        credentials,
        service,
        coordinator,
    }
}

async fn authorize(h: &Harness) {
    h.credentials
        .save_credential(&Credential {
            access_token: secret_string("token".to_string()),
            refresh_token: None,
            expires_at: Utc::now() + ChronoDuration::hours(1),
            user_name: Some("permits@sfgov.org".to_string()),
            scope: None,
        })
        .await
        .unwrap();
}

fn pool(h: &Harness) -> (watch::Sender<bool>, ExportWorkerPool) {
    let (tx, rx) = watch::channel(false);
    let pool = ExportWorkerPool::spawn(h.coordinator.clone(), 2, 4, rx);
    (tx, pool)
}

#[tokio::test]
async fn test_trigger_without_credential_creates_nothing() {
    let server = Server::new_async().await;
    let h = harness(&server);
    let (_tx, pool) = pool(&h);

    h.service
        .create_submission(json!({"project_name": "1 Main St."}), None)
        .await
        .unwrap();

    let result = h.service.trigger_export(&pool).await;
    assert!(matches!(
        result,
        Err(ExportError::Credential(CredentialError::NotAuthorized))
    ));
    assert!(h.store.find_unfinished_export().await.unwrap().is_none());
    assert!(pool.drain(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_trigger_with_nothing_pending() {
    let server = Server::new_async().await;
    let h = harness(&server);
    authorize(&h).await;
    let (_tx, pool) = pool(&h);

    let outcome = h.service.trigger_export(&pool).await.unwrap();
    assert_eq!(outcome, TriggerOutcome::NothingToExport);
    assert!(h.store.find_unfinished_export().await.unwrap().is_none());
    assert!(pool.drain(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_trigger_reports_running_batch() {
    let server = Server::new_async().await;
    let h = harness(&server);
    authorize(&h).await;
    let (_tx, pool) = pool(&h);

    let running = ExportBatch::new(None);
    h.store.create_export(&running).await.unwrap();
    h.service
        .create_submission(json!({"project_name": "1 Main St."}), None)
        .await
        .unwrap();

    let outcome = h.service.trigger_export(&pool).await.unwrap();
    assert_eq!(outcome, TriggerOutcome::InProgress(running.id));
    assert!(pool.drain(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_triggered_batch_runs_to_completion() {
    let server = Server::new_async().await;
    let h = harness(&server);
    authorize(&h).await;
    let (_tx, pool) = pool(&h);

    // Stored directly so the malformed payload reaches the export
    h.store
        .insert_submission(json!({"files": []}), None)
        .await
        .unwrap();

    let outcome = h.service.trigger_export(&pool).await.unwrap();
    let TriggerOutcome::Started(batch_id) = outcome else {
        panic!("expected a started batch, got {outcome:?}");
    };

    assert!(pool.drain(Duration::from_secs(10)).await);

    let view = h.service.export_status(&batch_id.to_string()).await.unwrap();
    assert!(view.is_finished);
    assert!(view.error.is_none());
    assert!(view.success.is_empty());
    assert_eq!(view.failure.len(), 1);
    assert!(view.failure[0].err.contains("project_name or project_id is required"));

    let batch = h.store.get_export(batch_id).await.unwrap().unwrap();
    assert_eq!(batch.initiator.as_deref(), Some("permits@sfgov.org"));
    assert!(batch.date_finished.is_some());
}

#[tokio::test]
async fn test_enqueue_after_shutdown_finishes_batch_with_error() {
    let server = Server::new_async().await;
    let h = harness(&server);
    authorize(&h).await;

    let (tx, rx) = watch::channel(false);
    let pool = ExportWorkerPool::spawn(h.coordinator.clone(), 1, 1, rx);
    tx.send(true).unwrap();

    // Let the worker observe the signal and stop
    tokio::time::sleep(Duration::from_millis(50)).await;

    h.service
        .create_submission(json!({"project_name": "1 Main St."}), None)
        .await
        .unwrap();

    let err = h.service.trigger_export(&pool).await.unwrap_err();
    assert!(err.to_string().contains("not running"));

    // The batch was created, then closed with the scheduling error
    assert!(h.store.find_unfinished_export().await.unwrap().is_none());
    assert_eq!(h.store.count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn test_export_status_rejects_unknown_ids() {
    let server = Server::new_async().await;
    let h = harness(&server);

    assert!(h.service.export_status("not-a-uuid").await.is_err());
    assert!(h
        .service
        .export_status(&ExportBatch::new(None).id.to_string())
        .await
        .is_err());
}

#[tokio::test]
async fn test_shutdown_stops_idle_workers() {
    let server = Server::new_async().await;
    let h = harness(&server);
    let (tx, pool) = pool(&h);

    tx.send(true).unwrap();
    assert!(pool.drain(Duration::from_secs(5)).await);
}
