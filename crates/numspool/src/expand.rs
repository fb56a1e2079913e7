//! Candidate expansion for a single matched segment.
//!
//! [`expand`] turns one [`SegmentRecord`] plus a [`SuffixRule`] into the
//! finite sequence of full-length identifiers it implies. The returned
//! [`Expansion`] is a pure, exact-size iterator with no hidden state between
//! calls: callers may consume it once, materialize it, or drop it halfway
//! through, and a fresh call to [`expand`] always restarts from the top.
//!
//! Preconditions on digit widths (`prefix` 3 digits, `suffix` 4, the fixed
//! rule digits 3 or 4) are the caller's responsibility; they are validated
//! before the engine runs.

use crate::filter::{Identifier, SegmentRecord, SuffixRule};

/// Expands one segment under the given suffix rule.
///
/// Cardinality is fixed by the rule: [`SuffixRule::Exact4`] emits exactly
/// one identifier, [`SuffixRule::Exact3`] exactly ten (one per leading local
/// digit), and [`SuffixRule::All`] exactly 10,000 (`0000..=9999`,
/// zero-padded). All variants emit in ascending order.
pub fn expand(segment: &SegmentRecord, rule: &SuffixRule) -> Expansion {
    let head = format!("{}{}", segment.prefix, segment.suffix);
    let state = match rule {
        SuffixRule::All => State::Full { next: 0 },
        SuffixRule::Exact3(tail) => State::Exact3 {
            tail: tail.clone(),
            next: 0,
        },
        SuffixRule::Exact4(local) => State::Exact4 {
            local: Some(local.clone()),
        },
    };
    Expansion { head, state }
}

/// Lazy identifier sequence produced by [`expand`].
#[derive(Clone, Debug)]
pub struct Expansion {
    /// The shared 7-digit `prefix + suffix` head.
    head: String,
    state: State,
}

#[derive(Clone, Debug)]
enum State {
    Exact4 { local: Option<String> },
    Exact3 { tail: String, next: u8 },
    Full { next: u32 },
}

impl Iterator for Expansion {
    type Item = Identifier;

    fn next(&mut self) -> Option<Identifier> {
        match &mut self.state {
            State::Exact4 { local } => {
                let local = local.take()?;
                Some(format!("{}{local}", self.head))
            }
            State::Exact3 { tail, next } => {
                if *next >= 10 {
                    return None;
                }
                let digit = *next;
                *next += 1;
                Some(format!("{}{digit}{tail}", self.head))
            }
            State::Full { next } => {
                if *next >= 10_000 {
                    return None;
                }
                let local = *next;
                *next += 1;
                Some(format!("{}{local:04}", self.head))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match &self.state {
            State::Exact4 { local } => usize::from(local.is_some()),
            State::Exact3 { next, .. } => 10 - usize::from(*next),
            State::Full { next } => 10_000 - *next as usize,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Expansion {}

impl core::iter::FusedIterator for Expansion {}
