//! Scheduled spool sweep.

use core::time::Duration;
use std::path::PathBuf;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Sweeps `spool` on a fixed interval until `shutdown` fires.
///
/// The sweep itself is best-effort (`numspool::sweep` swallows per-file
/// failures), so a failed tick never stops the loop. The first tick fires
/// one full interval after startup; `/api/cleanup` covers the on-demand
/// case.
pub async fn run(
    spool: PathBuf,
    max_age: Duration,
    sweep_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval()'s first tick completes immediately; consume it so the
    // first real sweep happens one interval in.
    ticker.tick().await;

    tracing::debug!(
        spool = %spool.display(),
        interval_secs = sweep_interval.as_secs(),
        "retention task started"
    );

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::debug!("retention task stopped");
                break;
            }
            _ = ticker.tick() => {
                let spool = spool.clone();
                let deleted = tokio::task::spawn_blocking(move || numspool::sweep(&spool, max_age))
                    .await
                    .unwrap_or(0);
                tracing::debug!(deleted, "scheduled sweep finished");
            }
        }
    }
}
