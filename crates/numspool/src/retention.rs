//! Retention sweep over the artifact store.

use core::time::Duration;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Removes regular files in `store` whose modification time is older than
/// `max_age`. Non-recursive.
///
/// Per-file failures (permissions, a concurrent removal) are swallowed; the
/// returned count reflects only successful deletions. A missing or
/// unreadable store directory is a no-op. Safe to run concurrently with
/// generation: file names are collision-free, and readers racing a deletion
/// treat the vanished file as expired.
pub fn sweep(store: &Path, max_age: Duration) -> u64 {
    let entries = match fs::read_dir(store) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(store = %store.display(), error = %e, "retention sweep skipped");
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age && fs::remove_file(entry.path()).is_ok() {
            tracing::debug!(file = %entry.path().display(), "expired artifact removed");
            deleted += 1;
        }
    }

    if deleted > 0 {
        tracing::info!(store = %store.display(), deleted, "retention sweep complete");
    }

    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn old_files_are_deleted_and_counted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("b.txt"), "y").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let deleted = sweep(dir.path(), Duration::ZERO);

        assert_eq!(deleted, 2);
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn fresh_files_are_left_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let deleted = sweep(dir.path(), Duration::from_secs(3600));

        assert_eq!(deleted, 0);
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn subdirectories_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/a.txt"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let deleted = sweep(dir.path(), Duration::ZERO);

        assert_eq!(deleted, 0);
        assert!(dir.path().join("nested/a.txt").exists());
    }

    #[test]
    fn missing_store_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        assert_eq!(sweep(&missing, Duration::ZERO), 0);
    }
}
