//! SenderPool - bounded set of sender tasks on a dedicated runtime

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{Batch, DeliveryError, Transport};
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::DeliveryMetrics;

const THREAD_NAME: &str = "signal-sender";

/// Pool of `max_workers` senders sharing one unbounded queue
///
/// Submitting never waits on I/O. The pool owns its own multi-thread
/// runtime, so producers may live on plain threads.
pub struct SenderPool {
    tx: Sender<Batch>,
    runtime: Runtime,
    workers: Vec<JoinHandle<()>>,
    metrics: Arc<DeliveryMetrics>,
}

impl SenderPool {
    /// Start the runtime and spawn the sender tasks
    pub fn spawn<T>(
        transport: Arc<T>,
        max_workers: usize,
        metrics: Arc<DeliveryMetrics>,
    ) -> std::io::Result<Self>
    where
        T: Transport + Send + Sync + 'static,
    {
        let max_workers = max_workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(max_workers)
            .thread_name(THREAD_NAME)
            .enable_all()
            .build()?;

        let (tx, rx) = async_channel::unbounded();

        let workers = (0..max_workers)
            .map(|id| {
                runtime.spawn(send_worker(
                    id,
                    Arc::clone(&transport),
                    rx.clone(),
                    Arc::clone(&metrics),
                ))
            })
            .collect();

        debug!(max_workers, "Sender pool started");

        Ok(Self {
            tx,
            runtime,
            workers,
            metrics,
        })
    }

    /// Queue a batch for delivery (non-blocking)
    ///
    /// Returns false if the pool no longer accepts work.
    pub fn submit(&self, batch: Batch) -> bool {
        match self.tx.try_send(batch) {
            Ok(()) => {
                let depth = self.tx.len();
                self.metrics.inc_submitted();
                self.metrics.set_queued(depth);
                observability::metrics::record_pool_queue_depth(depth);
                true
            }
            Err(TrySendError::Closed(batch)) | Err(TrySendError::Full(batch)) => {
                self.metrics.inc_dropped();
                error!(batch_len = batch.len(), "Sender pool closed, batch dropped");
                false
            }
        }
    }

    /// Batches waiting for a sender
    pub fn queued(&self) -> usize {
        self.tx.len()
    }

    /// Stop accepting work and wait until every queued batch is sent
    ///
    /// Blocks the calling thread.
    #[instrument(name = "sender_pool_shutdown", skip(self), fields(queued = self.tx.len()))]
    pub fn shutdown(self) {
        let Self {
            tx,
            runtime,
            workers,
            metrics,
        } = self;

        // Senders exit once the queue is closed and drained
        tx.close();

        let drain = move || {
            runtime.block_on(async move {
                for worker in workers {
                    if let Err(e) = worker.await {
                        error!(error = ?e, "Sender task panicked");
                    }
                }
            });
        };

        // block_on and dropping a runtime both panic inside an async context
        if Handle::try_current().is_ok() {
            if std::thread::spawn(drain).join().is_err() {
                error!("Sender pool drain thread panicked");
            }
        } else {
            drain();
        }

        metrics.set_queued(0);
        debug!("Sender pool shutdown complete");
    }
}

/// Sender task: pulls batches until the queue is closed and empty
#[instrument(
    name = "send_worker_loop",
    skip(transport, rx, metrics),
    fields(worker = id, transport = %transport.name())
)]
async fn send_worker<T>(
    id: usize,
    transport: Arc<T>,
    rx: Receiver<Batch>,
    metrics: Arc<DeliveryMetrics>,
) where
    T: Transport + Send + Sync + 'static,
{
    debug!("Sender started");

    while let Ok(batch) = rx.recv().await {
        metrics.set_queued(rx.len());
        let batch_len = batch.len();

        match transport.send_batch(&batch).await {
            Ok(()) => {
                metrics.inc_delivered();
                observability::metrics::record_batch_delivery("delivered", batch_len);
                debug!(batch_len, "Batch delivered");
            }
            Err(e) => {
                metrics.record_failure(&e);
                observability::metrics::record_batch_delivery(e.label(), batch_len);
                report_failure(&e, batch_len);
                // Keep going, one failed batch never stops the sender
            }
        }
    }

    debug!("Sender stopped");
}

fn report_failure(e: &DeliveryError, batch_len: usize) {
    match e {
        DeliveryError::AuthenticationRejected { .. } | DeliveryError::TransportFailure { .. } => {
            error!(batch_len, outcome = e.label(), error = %e, "Batch delivery failed");
        }
        DeliveryError::DataRejected
        | DeliveryError::UnexpectedStatus(_)
        | DeliveryError::Closed => {
            warn!(batch_len, outcome = e.label(), error = %e, "Batch delivery failed");
        }
    }
}
