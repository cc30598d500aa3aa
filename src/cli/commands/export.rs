//! Export command implementation
//!
//! This module implements the `export` command: it triggers a batch the same
//! way the interactive front end does and waits for the worker pool to run it.

use super::context::{exit_code_for, load_valid_config, AppContext, EXIT_FATAL};
use crate::core::export::{ExportCoordinator, ExportWorkerPool, TriggerOutcome};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the number of export workers
    #[arg(long)]
    pub workers: Option<usize>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_valid_config(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        if let Some(workers) = self.workers {
            tracing::info!(workers, "Overriding worker count from CLI");
            config.export.workers = workers.clamp(1, 32);
        }

        let shutdown_timeout = Duration::from_secs(config.export.shutdown_timeout_secs);
        let ctx = match AppContext::connect_or_exit(config).await {
            Ok(ctx) => ctx,
            Err(code) => return Ok(code),
        };

        let pending = ctx.store.count_pending().await?;
        if !self.yes {
            println!("Export Configuration:");
            println!("  Document service: {}", ctx.config.bluebeam.api_base_url);
            println!("  Storage: {}", ctx.store.backend_name());
            println!("  Pending submissions: {pending}");
            println!("  Workers: {}", ctx.config.export.workers);
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(0);
            }
        }

        let coordinator = Arc::new(ExportCoordinator::new(
            &ctx.config,
            ctx.store.clone(),
            ctx.client.clone(),
            ctx.credentials.clone(),
        )?);
        let pool = ExportWorkerPool::spawn(
            coordinator,
            ctx.config.export.workers,
            ctx.config.export.queue_capacity,
            shutdown_signal.clone(),
        );

        let service = ctx.service();
        let batch_id = match service.trigger_export(&pool).await {
            Ok(TriggerOutcome::Started(id)) => id,
            Ok(TriggerOutcome::InProgress(id)) => {
                println!("⏳ Export {id} is still in progress. Check it with `permit-export status {id}`.");
                return Ok(0);
            }
            Ok(TriggerOutcome::NothingToExport) => {
                println!("✅ Nothing to export.");
                return Ok(0);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to trigger export");
                println!("❌ Export failed to start: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("🚀 Export {batch_id} started");
        println!();

        if !wait_for_workers(pool, shutdown_signal, shutdown_timeout).await {
            println!("⚠️  Export interrupted before the batch finished.");
            println!("   Submissions already exported are recorded; run export again for the rest.");
            return Ok(130);
        }

        let view = match service.export_status(&batch_id.to_string()).await {
            Ok(view) => view,
            Err(e) => {
                println!("❌ Failed to read export result: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        println!("📊 Export Summary:");
        println!("  Export: {}", view.id);
        println!("  Successful: {}", view.success.len());
        println!("  Failed: {}", view.failure.len());
        for failure in &view.failure {
            println!("    - submission {}: {}", failure.id, failure.err);
        }
        println!();

        let exit_code = if !view.is_finished || view.error.is_some() {
            if let Some(error) = &view.error {
                println!("❌ Export did not run: {error}");
            } else {
                println!("❌ Export did not finish");
            }
            EXIT_FATAL
        } else if view.failure.is_empty() {
            println!("✅ Export completed successfully!");
            0
        } else {
            println!("⚠️  Export completed with failures");
            1
        };

        Ok(exit_code)
    }
}

/// Waits for queued batches; after a shutdown signal waits at most `timeout`
async fn wait_for_workers(
    pool: ExportWorkerPool,
    mut shutdown_signal: watch::Receiver<bool>,
    timeout: Duration,
) -> bool {
    let drain = pool.drain(Duration::MAX);
    tokio::pin!(drain);

    let signalled = async {
        loop {
            if *shutdown_signal.borrow() {
                return;
            }
            if shutdown_signal.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        finished = &mut drain => finished,
        _ = signalled => {
            println!("\n⚠️  Shutdown signal received, completing current batch...");
            tokio::time::timeout(timeout, &mut drain).await.unwrap_or(false)
        }
    }
}
