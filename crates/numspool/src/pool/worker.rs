use crate::expand::expand;
use crate::pool::request::WorkRequest;
use tokio::sync::mpsc;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Each worker materializes one segment expansion at a time and sends the
/// run back over the request's oneshot channel. The loop runs until a
/// shutdown request arrives or the channel closes.
///
/// Designed to be spawned as a Tokio task by
/// [`GenerationEngine::new`](crate::GenerationEngine::new).
pub(crate) async fn worker_loop(worker_id: usize, mut rx: mpsc::Receiver<WorkRequest>) {
    tracing::trace!(worker_id, "expansion worker started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Expand {
                segment,
                rule,
                result_tx,
            } => {
                let run: Vec<_> = expand(&segment, &rule).collect();
                if result_tx.send(run).is_err() {
                    // Requester gave up (cancelled or dropped); nothing to do.
                    tracing::debug!(worker_id, "result receiver dropped, discarding run");
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!(worker_id, "received shutdown signal");
                if response.send(()).is_err() {
                    tracing::error!(worker_id, "failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!(worker_id, "expansion worker stopped");
}
