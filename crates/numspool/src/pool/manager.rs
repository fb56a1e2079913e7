//! Round-robin dispatcher over the expansion workers.

use crate::error::{Error, Result};
use crate::pool::request::WorkRequest;
use core::time::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
///
/// Workers receive requests over bounded MPSC channels (buffer 1, so at most
/// one expansion is in flight per worker and dispatch backpressures instead
/// of queueing unboundedly). Work is distributed round-robin and the pool
/// supports graceful, acknowledged shutdown.
pub(crate) struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
}

impl WorkerPool {
    /// Constructs a pool from initialized worker channels and a shared
    /// cancellation token.
    pub(crate) const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
        }
    }

    /// Returns the index of the next worker to receive work (round-robin).
    fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends a [`WorkRequest`] to the next worker in the rotation.
    ///
    /// # Errors
    ///
    /// - [`Error::Shutdown`] if the pool is shutting down.
    /// - [`Error::Channel`] if the worker's channel is closed.
    pub(crate) async fn dispatch(&self, request: WorkRequest) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::Shutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::Channel {
                context: format!("worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// Cancels the shared token so no new work is accepted, then sends each
    /// worker a shutdown request and waits (up to 3 seconds per worker) for
    /// its acknowledgement.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.shutdown_token.cancel();

        tracing::debug!("notifying all expansion workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let timeout_futures = shutdown_handles.into_iter().map(|(i, rx)| async move {
            match timeout(Duration::from_secs(3), rx).await {
                Ok(Ok(())) => tracing::trace!("worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::error!("worker {i} returned error: {e}"),
                Err(_) => tracing::warn!("worker {i} shutdown timed out"),
            }
        });

        futures::future::join_all(timeout_futures).await;

        tracing::debug!("worker pool shutdown complete");
        Ok(())
    }

    /// Token observed by dispatch; cancelled once shutdown begins.
    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }
}
