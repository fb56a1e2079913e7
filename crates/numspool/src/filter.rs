//! # Filter and Segment Types
//!
//! The shared request-side data model: what the caller asks for
//! ([`FilterSpec`]) and what the lookup collaborator resolves it into
//! ([`SegmentRecord`]). Both are plain immutable values; the engine never
//! mutates or re-validates them.
//!
//! Field-level validation (digit widths, operator codes, non-empty
//! province/city) happens upstream, before the engine is invoked. The one
//! invariant the engine itself cares about — that at most one exact-suffix
//! constraint is present — is encoded structurally in [`SuffixRule`], so an
//! invalid combination cannot be represented at all.

use serde::{Deserialize, Serialize};

/// A generated 11-digit identifier: `prefix + suffix + local4`.
///
/// Identifiers only exist transiently as members of an ordered set; see
/// [`IdentifierSet`](crate::IdentifierSet).
pub type Identifier = String;

/// Constraint on the trailing 4-digit local block of generated identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuffixRule {
    /// No constraint: enumerate the full `0000..=9999` local block.
    All,
    /// The last 3 digits are fixed; the leading local digit is free.
    Exact3(String),
    /// The full local block is fixed: exactly one identifier per segment.
    Exact4(String),
}

impl SuffixRule {
    /// The token used in artifact file names: the fixed digits, or `ALL`.
    pub fn token(&self) -> &str {
        match self {
            Self::All => "ALL",
            Self::Exact3(digits) | Self::Exact4(digits) => digits,
        }
    }
}

/// A validated generation request.
///
/// `operators` narrows the segment lookup, not the expansion itself: by the
/// time segments reach the engine they are already restricted to these
/// operator codes. `max_count` is the per-request generation ceiling,
/// normally populated from [`EngineConfig::max_count`].
///
/// [`EngineConfig::max_count`]: crate::EngineConfig::max_count
#[derive(Clone, Debug)]
pub struct FilterSpec {
    /// Leading 3-digit block of every generated identifier.
    pub prefix: String,
    /// Province the segments must belong to.
    pub province: String,
    /// City the segments must belong to.
    pub city: String,
    /// Operator codes (1–5) the segments were restricted to.
    pub operators: Vec<u8>,
    /// Constraint on the trailing local block.
    pub rule: SuffixRule,
    /// Ceiling on the deduplicated identifier count.
    pub max_count: usize,
}

/// One matched (prefix, region-code) combination, as resolved by the lookup
/// collaborator.
///
/// Two records may share an identical `prefix + suffix` when a city maps the
/// same region code to more than one operator; the generation session
/// resolves the resulting duplicate identifiers silently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// 3-digit prefix block.
    pub prefix: String,
    /// 4-digit region-code block.
    pub suffix: String,
    pub province: String,
    pub city: String,
    /// Operator code, 1–5.
    pub operator: u8,
}
