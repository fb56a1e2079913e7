//! Generation sessions: expansion across all matched segments, dedup,
//! ordering, and capacity enforcement.
//!
//! [`GenerationEngine`] owns the expansion worker pool. One call to
//! [`GenerationEngine::generate`] is one session: every matched segment is
//! dispatched to the pool, the per-segment runs are merged into a single
//! deduplicated ascending sequence, and the result is checked against the
//! filter's ceiling before anything touches disk.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::filter::{FilterSpec, Identifier, SegmentRecord};
use crate::pool::manager::WorkerPool;
use crate::pool::request::WorkRequest;
use crate::pool::worker::worker_loop;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// A frozen generation result: identifiers in ascending lexicographic order
/// with no duplicates.
///
/// Identifiers are fixed-width digit strings, so lexicographic order equals
/// numeric order; this is the canonical output order and is reproducible for
/// identical inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentifierSet(pub(crate) Vec<Identifier>);

impl IdentifierSet {
    /// Number of identifiers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the set in its frozen ascending order.
    pub fn iter(&self) -> core::slice::Iter<'_, Identifier> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Identifier] {
        &self.0
    }
}

/// Orchestrates identifier generation over a pool of expansion workers.
///
/// Cloning is cheap; clones share the same worker pool. The engine is
/// created once at service startup and shut down once at service
/// termination.
#[derive(Clone)]
pub struct GenerationEngine {
    config: EngineConfig,
    pool: Arc<WorkerPool>,
}

impl GenerationEngine {
    /// Creates a new engine and spawns its pool of expansion workers.
    ///
    /// Each worker owns a bounded channel with buffer 1: dispatch hands one
    /// segment to one worker at a time and naturally backpressures when all
    /// workers are busy, which keeps memory bounded to the runs currently in
    /// flight plus the accumulated result.
    pub fn new(config: EngineConfig) -> Self {
        let num_workers = config.num_workers.max(1);
        let shutdown_token = CancellationToken::new();
        let mut workers = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx));
        }

        let pool = WorkerPool::new(workers, shutdown_token);

        Self {
            config,
            pool: Arc::new(pool),
        }
    }

    /// Configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one generation session.
    ///
    /// Empty `segments` yields an empty, non-error result; whether that is a
    /// user-facing failure is the caller's call. Duplicate identifiers
    /// (possible when two matched segments share an identical
    /// `prefix + suffix`) are resolved silently.
    ///
    /// The `cancel` token is consulted between segment dispatches so a
    /// caller-side timeout can abort a long full expansion cleanly; a worker
    /// mid-segment finishes its run and the result is discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::OverCapacity`] if the deduplicated count exceeds
    ///   `filter.max_count`. Checked post-dedup, before any write occurs.
    /// - [`Error::Cancelled`] if `cancel` fired.
    /// - [`Error::Shutdown`] / [`Error::Channel`] on engine teardown races.
    pub async fn generate(
        &self,
        filter: &FilterSpec,
        segments: Vec<SegmentRecord>,
        cancel: &CancellationToken,
    ) -> Result<IdentifierSet> {
        if segments.is_empty() {
            return Ok(IdentifierSet::default());
        }

        let segment_count = segments.len();
        let mut pending = Vec::with_capacity(segment_count);

        for segment in segments {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let (result_tx, result_rx) = oneshot::channel();
            self.pool
                .dispatch(WorkRequest::Expand {
                    segment,
                    rule: filter.rule.clone(),
                    result_tx,
                })
                .await?;
            pending.push(result_rx);
        }

        let mut ids: Vec<Identifier> = Vec::new();
        for result_rx in pending {
            let run = result_rx.await.map_err(|_| Error::Channel {
                context: "worker dropped its result channel".to_string(),
            })?;
            ids.extend(run);
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        ids.sort_unstable();
        ids.dedup();

        if ids.len() > filter.max_count {
            return Err(Error::OverCapacity {
                limit: filter.max_count,
                actual: ids.len(),
            });
        }

        tracing::info!(
            segments = segment_count,
            identifiers = ids.len(),
            "generation session complete"
        );

        Ok(IdentifierSet(ids))
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New dispatches fail with [`Error::Shutdown`]; the call returns once
    /// every worker has acknowledged termination or timed out.
    pub async fn shutdown(&self) -> Result<()> {
        self.pool.shutdown().await
    }

    /// Cancelled once engine shutdown begins; callers can observe it to stop
    /// scheduling new sessions.
    pub fn shutdown_token(&self) -> &CancellationToken {
        self.pool.shutdown_token()
    }
}
