use std::fmt;

use serde::Serialize;

use crate::layout_engine::Side;

/// Identifier of a leaf. Unique among occupied leaves.
pub type LeafId = i64;

/// Shared by every unoccupied leaf.
pub const EMPTY_LEAF_ID: LeafId = 0;

/// Half-open interval `[start, end)` of leaf identifiers a branch may contain.
///
/// A branch hands the lower half of its range to its left child and the upper
/// half to its right child, so lookups can pick a subtree by comparing
/// identifiers without any parent links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct IdRange {
    pub start: LeafId,
    pub end: LeafId,
}

impl IdRange {
    /// The whole identifier space, owned by the first branch of a tree.
    pub const FULL: IdRange = IdRange {
        start: LeafId::MIN,
        end: LeafId::MAX,
    };

    pub const fn new(start: LeafId, end: LeafId) -> Self { Self { start, end } }

    pub fn is_well_formed(self) -> bool { self.start <= self.end }

    /// Number of identifiers in the range.
    pub fn len(self) -> u64 {
        // i128 because `FULL` spans more than i64::MAX identifiers.
        (self.end as i128 - self.start as i128).max(0) as u64
    }

    pub fn is_empty(self) -> bool { self.len() == 0 }

    pub fn contains(self, id: LeafId) -> bool { self.start <= id && id < self.end }

    pub fn contains_range(self, other: IdRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// `start + (end - start) / 2`, computed without overflowing.
    pub fn midpoint(self) -> LeafId {
        let start = self.start as i128;
        let end = self.end as i128;
        (start + (end - start) / 2) as LeafId
    }

    pub fn lower(self) -> IdRange { IdRange::new(self.start, self.midpoint()) }

    pub fn upper(self) -> IdRange { IdRange::new(self.midpoint(), self.end) }

    pub fn half(self, side: Side) -> IdRange {
        match side {
            Side::Left => self.lower(),
            Side::Right => self.upper(),
        }
    }

    /// Whether a branch owning this range can give both children at least one
    /// identifier.
    pub fn can_split(self) -> bool { self.len() >= 2 }

    /// Moves `id` onto the nearest bound of the range if it lies outside.
    /// Returns `None` for an empty range.
    pub fn clamp(self, id: LeafId) -> Option<LeafId> {
        if self.is_empty() {
            return None;
        }
        Some(if id < self.start {
            self.start
        } else if id >= self.end {
            self.end - 1
        } else {
            id
        })
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn full_range_bisects_without_overflow() {
        let full = IdRange::FULL;
        assert_eq!(full.midpoint(), -1);
        assert_eq!(full.lower(), IdRange::new(LeafId::MIN, -1));
        assert_eq!(full.upper(), IdRange::new(-1, LeafId::MAX));
        assert_eq!(full.len(), u64::MAX);
    }

    #[test]
    fn halves_partition_the_range() {
        for (start, end) in [(0, 10), (-7, 4), (3, 4), (5, 5), (-9, -2)] {
            let range = IdRange::new(start, end);
            let (lo, hi) = (range.lower(), range.upper());
            assert_eq!(lo.start, range.start);
            assert_eq!(lo.end, hi.start);
            assert_eq!(hi.end, range.end);
            assert_eq!(lo.len() + hi.len(), range.len());
        }
    }

    #[test]
    fn clamp_moves_to_the_nearest_bound() {
        let range = IdRange::new(10, 20);
        assert_eq!(range.clamp(15), Some(15));
        assert_eq!(range.clamp(3), Some(10));
        assert_eq!(range.clamp(20), Some(19));
        assert_eq!(range.clamp(LeafId::MAX), Some(19));
        assert_eq!(IdRange::new(4, 4).clamp(4), None);
    }

    #[test]
    fn a_single_identifier_cannot_be_split() {
        assert!(!IdRange::new(7, 8).can_split());
        assert!(IdRange::new(7, 9).can_split());
        assert_eq!(IdRange::new(7, 9).lower(), IdRange::new(7, 8));
        assert_eq!(IdRange::new(7, 9).upper(), IdRange::new(8, 9));
    }
}
