//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the exporter configuration file.

use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Bluebeam API: {}", config.bluebeam.api_base_url);
        println!("  Bluebeam Auth Server: {}", config.bluebeam.auth_server);
        println!(
            "  Redirect URI: {}",
            config.bluebeam.redirect_uri.as_deref().unwrap_or("(not set)")
        );

        match config.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        pg_config
                            .connection_string
                            .expose_secret()
                            .as_ref()
                            .split('@')
                            .next_back()
                            .unwrap_or("***")
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            DatabaseTarget::Memory => {
                println!("  Database Target: in-memory (nothing is persisted)");
            }
        }

        println!(
            "  Upload Folder: {}",
            config.directories.upload_folder_name().unwrap_or("(none)")
        );
        println!("  Submittal Prefix: {}", config.directories.submittal_prefix);
        println!(
            "  Storage Proxy: {}",
            config.storage.domain.as_deref().unwrap_or("(disabled)")
        );
        println!(
            "  Status Tracker: {}",
            config
                .status_log
                .as_ref()
                .map(|s| s.endpoint.as_str())
                .unwrap_or("(disabled)")
        );
        println!("  Workers: {}", config.export.workers);
        println!();
        Ok(0)
    }
}
