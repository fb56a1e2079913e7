//! SQLite-backed segment lookup.
//!
//! Thin, stateless query layer over the `phone_location` table. All methods
//! are synchronous; handlers call them through `spawn_blocking`. Queries are
//! treated as black-box, side-effect-free lookups and are never retried.

use numspool::SegmentRecord;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

/// Lookup failures; collapsed into a generic 500 at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Pooled handle to the segment database. Cloning shares the pool.
#[derive(Clone)]
pub struct SegmentStore {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl SegmentStore {
    /// Opens (creating if necessary) the database at `path` and ensures the
    /// lookup table exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = r2d2::Pool::builder().build(manager)?;
        let store = Self { pool };
        store.ensure_schema()?;
        Ok(store)
    }

    pub(crate) fn connection(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS phone_location (
                prefix TEXT NOT NULL,
                suffix TEXT NOT NULL,
                province TEXT NOT NULL,
                city TEXT NOT NULL,
                operator INTEGER NOT NULL
            )",
        )?;
        Ok(())
    }

    /// Builds the query-side indexes. Called after bulk import rather than
    /// at open so imports don't pay for index maintenance row by row.
    pub fn create_indexes(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_prefix ON phone_location(prefix);
             CREATE INDEX IF NOT EXISTS idx_province_city ON phone_location(province, city);
             CREATE INDEX IF NOT EXISTS idx_operator ON phone_location(operator);
             CREATE INDEX IF NOT EXISTS idx_prefix_province_city
                 ON phone_location(prefix, province, city);",
        )?;
        Ok(())
    }

    /// Number of rows in the lookup table.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM phone_location", [], |row| {
            row.get(0)
        })?;
        Ok(count as u64)
    }

    /// Distinct provinces, alphabetical.
    pub fn provinces(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT province FROM phone_location ORDER BY province")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Distinct cities of a province, alphabetical.
    pub fn cities(&self, province: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT city FROM phone_location WHERE province = ?1 ORDER BY city",
        )?;
        let rows = stmt.query_map(params![province], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Segments matching a (prefix, province, city) triple, optionally
    /// narrowed to a set of operator codes.
    pub fn find_segments(
        &self,
        prefix: &str,
        province: &str,
        city: &str,
        operators: &[u8],
    ) -> Result<Vec<SegmentRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT prefix, suffix, province, city, operator FROM phone_location
             WHERE prefix = ?1 AND province = ?2 AND city = ?3",
        );
        if !operators.is_empty() {
            // Operator codes are validated single digits upstream.
            let list = operators
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",");
            sql.push_str(&format!(" AND operator IN ({list})"));
        }

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![prefix, province, city], |row| {
            Ok(SegmentRecord {
                prefix: row.get(0)?,
                suffix: row.get(1)?,
                province: row.get(2)?,
                city: row.get(3)?,
                operator: row.get::<_, i64>(4)? as u8,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_rows(rows: &[(&str, &str, &str, &str, u8)]) -> (TempDir, SegmentStore) {
        let dir = TempDir::new().unwrap();
        let store = SegmentStore::open(&dir.path().join("seg.db")).unwrap();
        {
            let conn = store.connection().unwrap();
            for (prefix, suffix, province, city, operator) in rows {
                conn.execute(
                    "INSERT INTO phone_location (prefix, suffix, province, city, operator)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![prefix, suffix, province, city, operator],
                )
                .unwrap();
            }
        }
        (dir, store)
    }

    #[test]
    fn provinces_are_distinct_and_sorted() {
        let (_dir, store) = store_with_rows(&[
            ("139", "1234", "广东", "深圳", 1),
            ("139", "1235", "广东", "广州", 1),
            ("138", "2000", "北京", "北京", 2),
        ]);
        assert_eq!(store.provinces().unwrap(), vec!["北京", "广东"]);
        assert_eq!(store.cities("广东").unwrap(), vec!["广州", "深圳"]);
    }

    #[test]
    fn find_segments_filters_by_operator() {
        let (_dir, store) = store_with_rows(&[
            ("139", "1234", "广东", "深圳", 1),
            ("139", "1234", "广东", "深圳", 2),
            ("139", "9999", "广东", "深圳", 3),
        ]);

        let all = store.find_segments("139", "广东", "深圳", &[]).unwrap();
        assert_eq!(all.len(), 3);

        let narrowed = store.find_segments("139", "广东", "深圳", &[1, 2]).unwrap();
        assert_eq!(narrowed.len(), 2);
        assert!(narrowed.iter().all(|s| s.suffix == "1234"));

        let none = store.find_segments("139", "广东", "东莞", &[]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn count_reflects_inserts() {
        let (_dir, store) = store_with_rows(&[("139", "1234", "广东", "深圳", 1)]);
        assert_eq!(store.count().unwrap(), 1);
    }
}
