//! Background export workers
//!
//! Batches are queued by id and each worker runs one batch to completion
//! before taking the next. Several batches may run at once on different
//! workers.

use crate::core::export::coordinator::ExportCoordinator;
use crate::domain::ids::BatchId;
use crate::domain::{ExportError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

/// Pool of workers consuming a bounded batch queue
pub struct ExportWorkerPool {
    sender: mpsc::Sender<BatchId>,
    workers: Vec<JoinHandle<()>>,
}

impl ExportWorkerPool {
    /// Spawn `workers` tasks over a queue holding up to `capacity` batches
    ///
    /// When `shutdown_signal` flips to `true` idle workers stop; a worker
    /// in the middle of a batch finishes it first.
    pub fn spawn(
        coordinator: Arc<ExportCoordinator>,
        workers: usize,
        capacity: usize,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    coordinator.clone(),
                    receiver.clone(),
                    shutdown_signal.clone(),
                ))
            })
            .collect();

        Self { sender, workers }
    }

    /// Queue a batch
    ///
    /// # Errors
    ///
    /// Returns an error if the queue is full or the workers have stopped.
    pub fn enqueue(&self, batch_id: BatchId) -> Result<()> {
        self.sender.try_send(batch_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                ExportError::Other("export queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                ExportError::Other("export workers are not running".to_string())
            }
        })?;
        tracing::debug!(batch_id = %batch_id, "Queued export batch");
        Ok(())
    }

    /// Stop accepting batches and wait for queued ones to finish
    ///
    /// Workers still running after `timeout` are aborted; their batches stay
    /// unfinished.
    pub async fn drain(self, timeout: Duration) -> bool {
        drop(self.sender);
        let workers = self.workers;
        let abort_handles: Vec<_> = workers.iter().map(|w| w.abort_handle()).collect();

        match tokio::time::timeout(timeout, futures::future::join_all(workers)).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "Export workers did not finish in time");
                for handle in abort_handles {
                    handle.abort();
                }
                false
            }
        }
    }
}

async fn run_worker(
    worker: usize,
    coordinator: Arc<ExportCoordinator>,
    receiver: Arc<Mutex<mpsc::Receiver<BatchId>>>,
    mut shutdown_signal: watch::Receiver<bool>,
) {
    tracing::debug!(worker, "Export worker started");

    loop {
        if *shutdown_signal.borrow() {
            break;
        }

        let next = {
            let mut receiver = receiver.lock().await;
            tokio::select! {
                biased;
                changed = shutdown_signal.changed() => {
                    if changed.is_err() {
                        // Sender gone: no shutdown can arrive, keep draining
                        receiver.recv().await
                    } else {
                        continue;
                    }
                }
                batch = receiver.recv() => batch,
            }
        };

        let Some(batch_id) = next else {
            break;
        };

        match coordinator.start_export(batch_id).await {
            Ok(summary) => tracing::info!(
                worker,
                batch_id = %batch_id,
                successful = summary.successful_exports(),
                failed = summary.failed_exports(),
                "Export batch finished"
            ),
            Err(e) => tracing::error!(
                worker,
                batch_id = %batch_id,
                error = %e,
                "Export batch did not finish"
            ),
        }
    }

    tracing::debug!(worker, "Export worker stopped");
}
