use std::cmp::{
    max,
    min,
};
use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

/// A 1-based, closed interval `[start, end]`.
///
/// The constructor does not enforce `start <= end`: swapped ranges come
/// straight from the input and are reported by the record checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Range {
    start: u64,
    end:   u64,
}

impl Range {
    pub fn new(
        start: u64,
        end: u64,
    ) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> u64 { self.start }

    pub fn end(&self) -> u64 { self.end }

    /// Number of positions covered. Zero for swapped ranges.
    pub fn length(&self) -> u64 {
        if self.is_valid() {
            self.end - self.start + 1
        }
        else {
            0
        }
    }

    pub fn is_valid(&self) -> bool { self.start <= self.end }

    pub fn set_start(
        &mut self,
        start: u64,
    ) {
        self.start = start;
    }

    pub fn set_end(
        &mut self,
        end: u64,
    ) {
        self.end = end;
    }

    /// Checks whether `other` lies completely inside this range.
    pub fn contains(
        &self,
        other: &Range,
    ) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_pos(
        &self,
        pos: u64,
    ) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn overlaps(
        &self,
        other: &Range,
    ) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when the two ranges touch without sharing a position.
    pub fn abuts(
        &self,
        other: &Range,
    ) -> bool {
        self.end.checked_add(1) == Some(other.start)
            || other.end.checked_add(1) == Some(self.start)
    }

    /// Smallest range covering both.
    pub fn join(
        &self,
        other: &Range,
    ) -> Range {
        Range::new(min(self.start, other.start), max(self.end, other.end))
    }

    /// Moves both bounds by `offset`. Returns `None` when a bound would drop
    /// below `floor` or overflow.
    pub fn shift(
        &self,
        offset: i64,
        floor: u64,
    ) -> Option<Range> {
        let start = self.start.checked_add_signed(offset)?;
        let end = self.end.checked_add_signed(offset)?;
        if start < floor || end < floor {
            return None;
        }
        Some(Range::new(start, end))
    }
}

impl Display for Range {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "({},{})", self.start, self.end)
    }
}

impl From<(u64, u64)> for Range {
    fn from(value: (u64, u64)) -> Self { Range::new(value.0, value.1) }
}
