//! Storage factory
//!
//! This module creates the storage backend selected by configuration.

use crate::adapters::database::memory::MemoryStore;
use crate::adapters::database::traits::ExportStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, PermitExportConfig};
use crate::domain::{ExportError, Result};
use std::sync::Arc;

/// Create the storage backend based on the configuration
///
/// The PostgreSQL backend has its schema applied before it is returned.
///
/// # Errors
///
/// Returns an error if the backend cannot be created or the schema cannot be
/// applied.
pub async fn create_store(config: &PermitExportConfig) -> Result<Arc<dyn ExportStore>> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ExportError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            tracing::debug!(connection = %client.connection_string_safe(), "PostgreSQL pool created");

            let adapter = PostgreSQLAdapter::new(client);
            adapter.ensure_schema().await?;

            Ok(Arc::new(adapter) as Arc<dyn ExportStore>)
        }
        DatabaseTarget::Memory => {
            tracing::warn!("Using in-memory store; nothing is persisted across runs");
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn ExportStore>)
        }
    }
}
