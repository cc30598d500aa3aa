//! Core business logic for the permit exporter.
//!
//! # Modules
//!
//! - [`credentials`] - Encrypted credential storage with single-flight refresh
//! - [`directories`] - Project folder provisioning and lookup
//! - [`export`] - Export orchestration, entry points and workers
//! - [`files`] - File download, archive expansion and filename sanitization
//!
//! # Export Workflow
//!
//! For every submission claimed by a batch:
//!
//! 1. **Path**: resubmission when the payload names an existing project, otherwise a new project
//! 2. **Project**: verify the existing project, or create one and its folder tree
//! 3. **Upload**: fetch each file, expand archives, upload into today's submittal folder
//! 4. **Access**: grant registered users full control (new projects only)
//! 5. **Status**: report the outcome to the status tracker when requested
//! 6. **Commit**: record the outcome on the submission immediately
//!
//! # Example
//!
//! ```rust,no_run
//! use permit_export::adapters::bluebeam::BluebeamClient;
//! use permit_export::adapters::database::create_store;
//! use permit_export::config::load_config;
//! use permit_export::core::credentials::{CredentialStore, TokenCipher};
//! use permit_export::core::export::{ExportCoordinator, ExportService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("permit-export.toml")?;
//! let store = create_store(&config).await?;
//! let client = Arc::new(BluebeamClient::new(&config.bluebeam, config.export.audit_body_limit)?);
//! let cipher = TokenCipher::new(&config.credentials.encryption_key)?;
//! let credentials = Arc::new(CredentialStore::new(store.clone(), client.clone(), cipher));
//!
//! let service = ExportService::new(store.clone(), credentials.clone());
//! let batch = service.create_export_record(None).await?;
//!
//! let coordinator = ExportCoordinator::new(&config, store, client, credentials)?;
//! let summary = coordinator.start_export(batch.id).await?;
//! println!("Exported {} of {}", summary.successful_exports(), summary.total_submissions);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod directories;
pub mod export;
pub mod files;
