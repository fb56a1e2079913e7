//! Engine configuration.

use core::time::Duration;

/// Tunable limits for a generation engine instance.
///
/// Passed explicitly into [`GenerationEngine::new`] rather than read from
/// global state, so concurrent engines can run with different limits (the
/// test suites rely on this).
///
/// [`GenerationEngine::new`]: crate::GenerationEngine::new
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Ceiling on the deduplicated identifier count of a single generation.
    pub max_count: usize,
    /// Partition size budget for oversized artifacts, in megabytes.
    pub file_partition_size_limit_mb: u64,
    /// Age after which the retention sweep removes an artifact, in hours.
    pub artifact_expiry_hours: u64,
    /// Number of expansion workers in the pool.
    pub num_workers: usize,
    /// Soft per-partition line ceiling, independent of the byte budget.
    pub max_partition_lines: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_count: 10_000_000,
            file_partition_size_limit_mb: 20,
            artifact_expiry_hours: 24,
            num_workers: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(4),
            max_partition_lines: 500_000,
        }
    }
}

impl EngineConfig {
    /// The partition byte budget.
    pub const fn max_partition_bytes(&self) -> u64 {
        self.file_partition_size_limit_mb * 1024 * 1024
    }

    /// The retention age threshold.
    pub const fn artifact_expiry(&self) -> Duration {
        Duration::from_secs(self.artifact_expiry_hours * 3600)
    }
}
