use crate::filter::{Identifier, SegmentRecord, SuffixRule};
use tokio::sync::oneshot;

/// A unit of work delivered to an expansion worker.
pub(crate) enum WorkRequest {
    /// Expand one segment under `rule` and send the materialized run back.
    ///
    /// The run arrives in ascending order (expansion emits ascending and a
    /// single segment never repeats a local block), which the session's
    /// merge step relies on only as an optimization; correctness comes from
    /// the global sort.
    Expand {
        segment: SegmentRecord,
        rule: SuffixRule,
        result_tx: oneshot::Sender<Vec<Identifier>>,
    },
    /// Stop the worker and acknowledge termination.
    Shutdown { response: oneshot::Sender<()> },
}
