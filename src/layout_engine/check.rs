use thiserror::Error;

use crate::common::collections::HashSet;
use crate::layout_engine::binary_tree::{Node, TreeCore};
use crate::layout_engine::{EMPTY_LEAF_ID, IdRange, LeafId, Side};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("invalid id range {range}")]
    InvalidRange { range: IdRange },
    #[error("branch range {range} escapes {allowed}")]
    RangeEscapes { range: IdRange, allowed: IdRange },
    #[error("leaf {id} ({app_id:?}) out of range {range}")]
    LeafOutOfRange {
        id: LeafId,
        app_id: String,
        range: IdRange,
    },
    #[error("{side} child: {source}")]
    Child {
        side: Side,
        source: Box<InvariantViolation>,
    },
    #[error("leaf id {0} is held by more than one app")]
    DuplicateId(LeafId),
    #[error("app {app_id:?} sits in leaf {leaf_id} but is indexed as {indexed:?}")]
    IndexMismatch {
        app_id: String,
        leaf_id: LeafId,
        indexed: Option<LeafId>,
    },
    #[error("app {0:?} is indexed but occupies no leaf")]
    OrphanedEntry(String),
    #[error("the empty name no longer maps to the empty leaf id")]
    ReservedEntry,
    #[error("focus cursor {path:?} does not lead to a leaf")]
    DanglingFocus { path: Vec<Side> },
}

/// Verifies the range structure below `node`, given the range its position
/// allows. Unoccupied leaves are exempt: they all share [`EMPTY_LEAF_ID`] or
/// a leftover clamped id.
pub fn check(node: &Node, range: IdRange) -> Result<(), InvariantViolation> {
    match node {
        Node::Leaf(leaf) => {
            if leaf.is_empty() || range.contains(leaf.id) {
                Ok(())
            } else {
                Err(InvariantViolation::LeafOutOfRange {
                    id: leaf.id,
                    app_id: leaf.app_id.clone(),
                    range,
                })
            }
        }
        Node::Branch(branch) => {
            if !branch.range.is_well_formed() {
                return Err(InvariantViolation::InvalidRange { range: branch.range });
            }
            if !range.contains_range(branch.range) {
                return Err(InvariantViolation::RangeEscapes {
                    range: branch.range,
                    allowed: range,
                });
            }
            for side in [Side::Left, Side::Right] {
                check(branch.child(side), branch.range.half(side)).map_err(|source| {
                    InvariantViolation::Child {
                        side,
                        source: Box::new(source),
                    }
                })?;
            }
            Ok(())
        }
    }
}

impl TreeCore {
    /// Full invariant sweep: ranges, id uniqueness, the name index and the
    /// focus cursor.
    pub(crate) fn validate(&self) -> Result<(), InvariantViolation> {
        check(&self.root, IdRange::FULL)?;

        if self.name_to_id.get("") != Some(&EMPTY_LEAF_ID) {
            return Err(InvariantViolation::ReservedEntry);
        }

        let mut ids = HashSet::default();
        let mut occupants = HashSet::default();
        for leaf in self.root.leaves().into_iter().filter(|leaf| !leaf.is_empty()) {
            if !ids.insert(leaf.id) {
                return Err(InvariantViolation::DuplicateId(leaf.id));
            }
            let indexed = self.name_to_id.get(&leaf.app_id).copied();
            if indexed != Some(leaf.id) || !occupants.insert(leaf.app_id.as_str()) {
                return Err(InvariantViolation::IndexMismatch {
                    app_id: leaf.app_id.clone(),
                    leaf_id: leaf.id,
                    indexed,
                });
            }
        }
        if let Some(name) = self
            .name_to_id
            .keys()
            .find(|name| !name.is_empty() && !occupants.contains(name.as_str()))
        {
            return Err(InvariantViolation::OrphanedEntry(name.clone()));
        }

        if self.focused_leaf().is_none() {
            return Err(InvariantViolation::DanglingFocus {
                path: self.focus.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::TilingSettings;
    use crate::layout_engine::Resolution;
    use crate::layout_engine::binary_tree::{Branch, Leaf};
    use crate::layout_engine::Orientation;

    fn leaf(id: LeafId, app_id: &str) -> Node {
        Node::Leaf(Leaf {
            id,
            app_id: app_id.to_owned(),
        })
    }

    fn branch(range: IdRange, left: Node, right: Node) -> Node {
        Node::Branch(Box::new(Branch::new(Orientation::Vertical, 50, range, left, right)))
    }

    #[test]
    fn a_well_formed_tree_passes() {
        let range = IdRange::new(0, 8);
        let tree = branch(
            range,
            leaf(3, "a"),
            branch(range.upper(), leaf(0, ""), leaf(7, "b")),
        );
        assert_eq!(check(&tree, range), Ok(()));
    }

    #[test]
    fn it_tags_the_side_of_an_out_of_range_leaf() {
        let range = IdRange::new(0, 8);
        let tree = branch(range, leaf(6, "a"), leaf(7, "b"));
        let err = check(&tree, range).unwrap_err();
        assert_eq!(err, InvariantViolation::Child {
            side: Side::Left,
            source: Box::new(InvariantViolation::LeafOutOfRange {
                id: 6,
                app_id: "a".to_owned(),
                range: IdRange::new(0, 4),
            }),
        });
        assert_eq!(err.to_string(), "left child: leaf 6 (\"a\") out of range [0, 4)");
    }

    #[test]
    fn it_nests_side_tags_for_deep_violations() {
        let range = IdRange::new(0, 8);
        let tree = branch(
            range,
            leaf(0, "a"),
            branch(range.upper(), leaf(4, "b"), leaf(5, "c")),
        );
        let err = check(&tree, range).unwrap_err();
        assert!(err.to_string().starts_with("right child: right child: leaf 5"), "{err}");
    }

    #[test]
    fn it_rejects_inverted_and_escaping_ranges() {
        let inverted = branch(IdRange::new(5, 2), leaf(0, ""), leaf(0, ""));
        assert_eq!(check(&inverted, IdRange::FULL), Err(InvariantViolation::InvalidRange {
            range: IdRange::new(5, 2),
        }));

        let escaping = branch(IdRange::new(0, 100), leaf(0, ""), leaf(0, ""));
        assert_eq!(
            check(&escaping, IdRange::new(0, 10)),
            Err(InvariantViolation::RangeEscapes {
                range: IdRange::new(0, 100),
                allowed: IdRange::new(0, 10),
            })
        );
    }

    #[test]
    fn empty_leaves_are_exempt_from_range_checks() {
        let range = IdRange::new(10, 20);
        let tree = branch(range, leaf(0, ""), leaf(0, ""));
        assert_eq!(check(&tree, range), Ok(()));
    }

    fn core_with(apps: &[&str]) -> TreeCore {
        let mut core = TreeCore::new(Resolution::default(), TilingSettings::default());
        for app in apps {
            core.add_app(app).unwrap();
        }
        core
    }

    #[test]
    fn validate_catches_index_drift() {
        let mut core = core_with(&["a", "b"]);
        assert_eq!(core.validate(), Ok(()));

        core.name_to_id.insert("a".to_owned(), 42);
        assert!(matches!(
            core.validate(),
            Err(InvariantViolation::IndexMismatch { indexed: Some(42), .. })
        ));
    }

    #[test]
    fn validate_catches_orphaned_and_reserved_entries() {
        let mut core = core_with(&["a"]);
        core.name_to_id.insert("ghost".to_owned(), 17);
        assert_eq!(core.validate(), Err(InvariantViolation::OrphanedEntry("ghost".to_owned())));

        let mut core = core_with(&["a"]);
        core.name_to_id.insert(String::new(), 5);
        assert_eq!(core.validate(), Err(InvariantViolation::ReservedEntry));
    }

    #[test]
    fn validate_catches_a_dangling_focus() {
        let mut core = core_with(&["a"]);
        core.focus = vec![Side::Left, Side::Left];
        assert_eq!(core.validate(), Err(InvariantViolation::DanglingFocus {
            path: vec![Side::Left, Side::Left],
        }));
    }
}
