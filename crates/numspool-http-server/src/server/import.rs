//! CSV bulk import into the segment lookup table.
//!
//! The input is the 5-column comma format `prefix,suffix,province,city,
//! operator` with a header row. Rows with the wrong field count or a
//! non-numeric operator are counted and skipped rather than aborting the
//! import. Input must be UTF-8.

use crate::server::store::SegmentStore;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const BATCH_SIZE: usize = 1_000;

#[derive(Clone, Copy, Debug, Default)]
pub struct ImportStats {
    pub inserted: u64,
    pub skipped: u64,
}

/// Imports `csv` into the lookup table.
///
/// When the table is already populated the import is skipped unless `force`
/// is set, in which case existing rows are cleared first. Rows are inserted
/// in batched transactions; indexes are (re)built once at the end.
pub fn import_csv(store: &SegmentStore, csv: &Path, force: bool) -> anyhow::Result<ImportStats> {
    let file =
        File::open(csv).with_context(|| format!("cannot open CSV file {}", csv.display()))?;

    if !force && store.count()? > 0 {
        tracing::info!("lookup table already populated, skipping import (use --force to redo)");
        return Ok(ImportStats::default());
    }

    let mut conn = store.connection()?;
    if force {
        conn.execute("DELETE FROM phone_location", [])?;
        tracing::info!("cleared existing segment rows");
    }

    let mut stats = ImportStats::default();
    let mut batch: Vec<[String; 5]> = Vec::with_capacity(BATCH_SIZE);
    let mut lines = BufReader::new(file).lines();

    // Header row.
    if lines.next().transpose()?.is_none() {
        anyhow::bail!("CSV file {} is empty", csv.display());
    }

    for line in lines {
        let line = line?;
        match parse_row(&line) {
            Some(row) => {
                batch.push(row);
                stats.inserted += 1;
                if batch.len() >= BATCH_SIZE {
                    insert_batch(&mut conn, &batch)?;
                    batch.clear();
                    if stats.inserted % 100_000 == 0 {
                        tracing::info!(rows = stats.inserted, "import in progress");
                    }
                }
            }
            None => stats.skipped += 1,
        }
    }
    if !batch.is_empty() {
        insert_batch(&mut conn, &batch)?;
    }
    drop(conn);

    store.create_indexes()?;

    tracing::info!(
        inserted = stats.inserted,
        skipped = stats.skipped,
        total = store.count()?,
        "CSV import complete"
    );
    Ok(stats)
}

fn parse_row(line: &str) -> Option<[String; 5]> {
    let mut fields = line.split(',').map(str::trim);
    let row = [
        fields.next()?.to_owned(),
        fields.next()?.to_owned(),
        fields.next()?.to_owned(),
        fields.next()?.to_owned(),
        fields.next()?.to_owned(),
    ];
    if fields.next().is_some() || row.iter().any(String::is_empty) {
        return None;
    }
    // Operator must be numeric.
    row[4].parse::<u8>().ok()?;
    Some(row)
}

fn insert_batch(
    conn: &mut r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>,
    batch: &[[String; 5]],
) -> anyhow::Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO phone_location (prefix, suffix, province, city, operator)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in batch {
            stmt.execute(rusqlite::params![row[0], row[1], row[2], row[3], row[4]])?;
        }
    }
    tx.commit()?;
    Ok(())
}
