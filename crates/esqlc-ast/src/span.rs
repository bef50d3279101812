//! Source location tracking

use serde::{Deserialize, Serialize};

/// Half-open byte range into the source text
///
/// Spans index the original input, so diagnostics and inline markers can
/// quote it verbatim. Hashable because the binding table is keyed by the
/// span of each host-variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    /// Exclusive
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
