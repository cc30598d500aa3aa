//! External system integrations for the permit exporter.
//!
//! This module provides adapters for integrating with external systems:
//!
//! - [`bluebeam`] - Bluebeam Studio document service (projects, folders, uploads, users)
//! - [`database`] - Storage abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation
//! - [`status_log`] - External spreadsheet status tracker
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the export engine
//! can be tested against mock servers and the in-memory store.
//!
//! ```rust,no_run
//! use permit_export::adapters::bluebeam::{BluebeamClient, DocumentService};
//! use permit_export::adapters::database::create_store;
//! use permit_export::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("permit-export.toml")?;
//! let store = create_store(&config).await?;
//! let client = BluebeamClient::new(&config.bluebeam, config.export.audit_body_limit)?;
//!
//! println!("{} submissions pending", store.count_pending().await?);
//! # Ok(())
//! # }
//! ```

pub mod bluebeam;
pub mod database;
pub mod postgresql;
pub mod status_log;
