//! # Artifact and Partition Descriptors
//!
//! Descriptor types for the files the engine writes, plus the naming
//! convention shared by the writer and the partitioner.
//!
//! ## Naming
//!
//! Artifacts are named `{prefix}_{province}_{city}_{token}_{stamp}.txt`,
//! where `token` is the fixed suffix digits or `ALL`, and `stamp` is a
//! second-resolution local timestamp. Partitions derived from an artifact
//! are named `part_{n}_{original}` with `n` starting at 1, so partitions
//! sort in generation order by name.

use crate::filter::{FilterSpec, SuffixRule};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// A persisted line-oriented artifact holding one identifier per line.
///
/// Created by [`write_artifact`](crate::write_artifact); removed by the
/// retention sweep once it outlives the configured expiry age.
#[derive(Clone, Debug, Serialize)]
pub struct Artifact {
    /// File name within the spool directory.
    pub name: String,
    /// Full path of the file.
    pub path: PathBuf,
    /// Final observed size after flush, in bytes.
    pub size_bytes: u64,
    /// Number of identifier lines.
    pub line_count: u64,
}

/// A size-bounded, line-aligned contiguous slice of an artifact.
///
/// Partitions are disjoint and ordered; concatenating them in sequence
/// order reproduces the source artifact byte-for-byte.
#[derive(Clone, Debug, Serialize)]
pub struct Partition {
    /// File name within the spool directory.
    pub name: String,
    /// Full path of the file.
    pub path: PathBuf,
    pub size_bytes: u64,
    /// 1-based sequence index.
    pub index: u32,
}

/// Builds the artifact file name for a filter at the given instant.
///
/// Path separators in province/city are replaced so the name stays a single
/// path component. The timestamp has second resolution, which is what keeps
/// concurrent requests from colliding; identical filters submitted within
/// the same second would produce the same name.
pub fn artifact_file_name(filter: &FilterSpec, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    format!(
        "{}_{}_{}_{}_{stamp}.txt",
        filter.prefix,
        sanitize(&filter.province),
        sanitize(&filter.city),
        filter.rule.token(),
    )
}

/// Name of partition `index` of the artifact named `original`.
pub(crate) fn partition_file_name(index: u32, original: &str) -> String {
    format!("part_{index}_{original}")
}

fn sanitize(component: &str) -> String {
    component.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filter(rule: SuffixRule) -> FilterSpec {
        FilterSpec {
            prefix: "139".into(),
            province: "广东".into(),
            city: "深圳".into(),
            operators: vec![],
            rule,
            max_count: 10_000_000,
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn name_encodes_filter_and_timestamp() {
        let name = artifact_file_name(&filter(SuffixRule::All), at());
        assert_eq!(name, "139_广东_深圳_ALL_20240501_123005.txt");
    }

    #[test]
    fn name_uses_exact_suffix_token() {
        let name = artifact_file_name(&filter(SuffixRule::Exact4("8888".into())), at());
        assert_eq!(name, "139_广东_深圳_8888_20240501_123005.txt");
    }

    #[test]
    fn name_sanitizes_path_separators() {
        let mut f = filter(SuffixRule::All);
        f.city = "那曲/改则".into();
        let name = artifact_file_name(&f, at());
        assert!(!name.contains('/'));
        assert!(name.contains("那曲_改则"));
    }

    #[test]
    fn partition_names_sort_in_sequence_order() {
        let original = "139_广东_深圳_ALL_20240501_123005.txt";
        assert_eq!(
            partition_file_name(1, original),
            format!("part_1_{original}")
        );
        assert_eq!(
            partition_file_name(2, original),
            format!("part_2_{original}")
        );
    }
}
