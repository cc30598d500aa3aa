// permit-export - Building-permit submission exporter for Bluebeam Studio
// Copyright (c) 2025 permit-export contributors
// Licensed under the MIT License

//! # permit-export
//!
//! Exports building-permit submissions into Bluebeam Studio projects.
//!
//! ## Overview
//!
//! A submission is either a **new project** (a project is created, the
//! standard folder tree is provisioned, documents are uploaded and registered
//! users receive full control) or a **resubmission** into an existing project
//! (documents are uploaded into a fresh dated submittal folder). Submissions
//! are exported in batches; each outcome is recorded as soon as it is known
//! and the batch keeps the full list of successes and failures.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (export, credentials, folders, files)
//! - [`adapters`] - External integrations (Bluebeam, PostgreSQL, status tracker)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use permit_export::adapters::bluebeam::BluebeamClient;
//! use permit_export::adapters::database::create_store;
//! use permit_export::config::load_config;
//! use permit_export::core::credentials::{CredentialStore, TokenCipher};
//! use permit_export::core::export::ExportCoordinator;
//! use permit_export::domain::ExportBatch;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("permit-export.toml")?;
//! let store = create_store(&config).await?;
//! let client = Arc::new(BluebeamClient::new(&config.bluebeam, config.export.audit_body_limit)?);
//! let cipher = TokenCipher::new(&config.credentials.encryption_key)?;
//! let credentials = Arc::new(CredentialStore::new(store.clone(), client.clone(), cipher));
//!
//! let batch = ExportBatch::new(None);
//! store.create_export(&batch).await?;
//!
//! let coordinator = ExportCoordinator::new(&config, store, client, credentials)?;
//! let summary = coordinator.start_export(batch.id).await?;
//! println!("Exported {} submissions", summary.successful_exports());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::ExportError`]; per-submission failures are
//! recorded on the submission and in the batch result rather than returned.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
