//! Shared command setup
//!
//! Loads configuration and wires the store, document-service client and
//! credential store the way every command that talks to them needs.

use crate::adapters::bluebeam::BluebeamClient;
use crate::adapters::database::{create_store, ExportStore};
use crate::config::{load_config, PermitExportConfig};
use crate::core::credentials::{CredentialStore, TokenCipher};
use crate::core::export::ExportService;
use crate::domain::ExportError;
use std::sync::Arc;

/// Configuration error exit code
pub const EXIT_CONFIG: i32 = 2;
/// Credential error exit code
pub const EXIT_CREDENTIAL: i32 = 3;
/// Connection error exit code
pub const EXIT_CONNECTION: i32 = 4;
/// Fatal error exit code
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error that stopped a command
pub fn exit_code_for(error: &ExportError) -> i32 {
    match error {
        ExportError::Configuration(_) | ExportError::Validation(_) => EXIT_CONFIG,
        ExportError::Credential(_) => EXIT_CREDENTIAL,
        ExportError::Database(_) | ExportError::Remote(_) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}

/// Load and validate configuration, reporting problems on stdout
pub fn load_valid_config(config_path: &str) -> Result<PermitExportConfig, i32> {
    let config = load_config(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })?;

    config.validate().map_err(|e| {
        tracing::error!(error = %e, "Configuration validation failed");
        println!("❌ Configuration validation failed");
        println!("   Error: {e}");
        EXIT_CONFIG
    })?;

    Ok(config)
}

/// Everything a command needs to reach storage and the document service
pub struct AppContext {
    pub config: PermitExportConfig,
    pub store: Arc<dyn ExportStore>,
    pub client: Arc<BluebeamClient>,
    pub credentials: Arc<CredentialStore>,
}

impl AppContext {
    /// Connect to storage and build the clients
    pub async fn connect(config: PermitExportConfig) -> crate::domain::Result<Self> {
        let store = create_store(&config).await?;
        store.test_connection().await?;

        let client = Arc::new(BluebeamClient::new(
            &config.bluebeam,
            config.export.audit_body_limit,
        )?);
        let cipher = TokenCipher::new(&config.credentials.encryption_key)?;
        let credentials = Arc::new(CredentialStore::new(store.clone(), client.clone(), cipher));

        Ok(Self {
            config,
            store,
            client,
            credentials,
        })
    }

    /// Like [`connect`](Self::connect), printing the failure and returning its
    /// exit code
    pub async fn connect_or_exit(config: PermitExportConfig) -> Result<Self, i32> {
        Self::connect(config).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize");
            println!("❌ Failed to initialize");
            println!("   Error: {e}");
            exit_code_for(&e)
        })
    }

    pub fn service(&self) -> ExportService {
        ExportService::new(self.store.clone(), self.credentials.clone())
    }
}
