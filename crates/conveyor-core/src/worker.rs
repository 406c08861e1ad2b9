//! Worker group: drains the submission queue into the lifecycle manager.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::processor::JobProcessor;
use crate::queue::JobQueue;

/// Worker group handle.
///
/// Spawns `n` workers that lease job ids and run them concurrently; the
/// parallelism ceiling is whatever `n` the caller derived from configuration.
/// Shutdown stops taking new leases without aborting in-flight handlers;
/// [`cancel_inflight`](WorkerGroup::cancel_inflight) additionally fires the
/// cooperative cancellation token handlers observe.
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    cancel: CancellationToken,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, queue: Arc<dyn JobQueue>, processor: Arc<JobProcessor>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let cancel = CancellationToken::new();

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let queue = Arc::clone(&queue);
            let processor = Arc::clone(&processor);
            let mut rx = shutdown_rx.clone();
            let cancel = cancel.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, queue, processor, &mut rx, cancel).await;
            });
            joins.push(join);
        }

        Self {
            shutdown_tx,
            cancel,
            joins,
        }
    }

    /// Stop taking new leases. In-flight handlers keep running.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Fire the cooperative cancellation token shared with every handler.
    pub fn cancel_inflight(&self) {
        self.cancel.cancel();
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn JobQueue>,
    processor: Arc<JobProcessor>,
    shutdown_rx: &mut watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // Leasing can wait indefinitely, so race it against shutdown.
        let job_id = tokio::select! {
            _ = shutdown_rx.changed() => continue,
            job_id = queue.dequeue() => job_id,
        };

        let Some(job_id) = job_id else {
            // Queue closed and drained.
            break;
        };

        // Failed and cancelled runs return their error by contract; the
        // worker reports and moves on.
        if let Err(error) = processor.run(job_id, &cancel).await {
            warn!(worker = worker_id, %job_id, %error, "job finished with error");
        }
    }
}
