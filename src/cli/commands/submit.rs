//! Submit command implementation
//!
//! Stores a submission payload read from a JSON file so the next export
//! picks it up.

use super::context::{exit_code_for, load_valid_config, AppContext, EXIT_CONFIG};
use crate::domain::ids::BatchId;
use clap::Args;

/// Arguments for the submit command
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// JSON file holding the submission payload
    pub file: String,

    /// Associate the submission with an existing export
    #[arg(long)]
    pub export_id: Option<String>,
}

impl SubmitArgs {
    /// Execute the submit command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let raw = match std::fs::read_to_string(&self.file) {
            Ok(raw) => raw,
            Err(e) => {
                println!("❌ Failed to read {}: {e}", self.file);
                return Ok(EXIT_CONFIG);
            }
        };
        let payload: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                println!("❌ {} is not valid JSON: {e}", self.file);
                return Ok(EXIT_CONFIG);
            }
        };
        let batch_id = match self.export_id.as_deref().map(str::parse::<BatchId>).transpose() {
            Ok(id) => id,
            Err(_) => {
                println!("❌ Invalid export id");
                return Ok(EXIT_CONFIG);
            }
        };

        let config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let ctx = match AppContext::connect_or_exit(config).await {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        match ctx.service().create_submission(payload, batch_id).await {
            Ok(submission) => {
                println!("✅ Created submission {}", submission.id);
                Ok(0)
            }
            Err(e) => {
                println!("❌ Submission rejected: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
