//! Status command implementation
//!
//! This module implements the `status` command for displaying the progress
//! and result of an export batch.

use super::context::{exit_code_for, load_valid_config, AppContext};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Export id to show; without it, shows pending work and any running export
    pub export_id: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let ctx = match AppContext::connect_or_exit(config).await {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let Some(export_id) = &self.export_id else {
            let pending = ctx.store.count_pending().await?;
            println!("📊 Export Status");
            println!();
            println!("  Pending submissions: {pending}");
            match ctx.store.find_unfinished_export().await? {
                Some(batch) => println!(
                    "  Running export: {} (started {})",
                    batch.id,
                    batch.date_started.format("%Y-%m-%d %H:%M:%S")
                ),
                None => println!("  Running export: none"),
            }
            return Ok(0);
        };

        let view = match ctx.service().export_status(export_id).await {
            Ok(view) => view,
            Err(e) => {
                println!("❌ {e}");
                return Ok(exit_code_for(&e));
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(0);
        }

        println!("📊 Export {}", view.id);
        println!();
        println!(
            "  Status: {}",
            if view.is_finished { "✅ Finished" } else { "🔄 In Progress" }
        );
        if let Some(error) = &view.error {
            println!("  Error: {error}");
        }
        println!("  Successful: {}", view.success.len());
        for success in &view.success {
            println!("    - submission {} → project {}", success.id, success.project_id);
        }
        println!("  Failed: {}", view.failure.len());
        for failure in &view.failure {
            println!("    - submission {}: {}", failure.id, failure.err);
        }
        println!();
        Ok(0)
    }
}
