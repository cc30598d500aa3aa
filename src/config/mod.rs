//! Configuration management for the permit exporter.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PERMIT_EXPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use permit_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("permit-export.toml")?;
//!
//! println!("Document service: {}", config.bluebeam.api_base_url);
//! println!("Workers: {}", config.export.workers);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`BluebeamConfig`] - Document service API and OAuth client
//! - [`DirectoryConfig`] - Folder tree created in new projects
//! - [`StorageConfig`] - Internal object storage shortcut
//! - [`StatusLoggerConfig`] - External status tracker
//! - [`PostgreSQLConfig`] - Database connection
//! - [`CredentialsConfig`] - Credential encryption key
//! - [`ExportConfig`] - Export engine settings
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! database_target = "postgresql"
//!
//! [bluebeam]
//! api_base_url = "https://studioapi.bluebeam.com/publicapi/v1"
//! auth_server = "https://authserver.bluebeam.com"
//! client_id = "${BLUEBEAM_CLIENT_ID}"
//! client_secret = "${BLUEBEAM_CLIENT_SECRET}"
//!
//! [postgresql]
//! connection_string = "${DATABASE_URL}"
//!
//! [credentials]
//! encryption_key = "${ENCRYPTION_KEY}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, BluebeamConfig, CredentialsConfig, DatabaseTarget, DirectoryConfig,
    Environment, ExportConfig, LoggingConfig, PermitExportConfig, PostgreSQLConfig,
    StatusLoggerConfig, StorageConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
