//! Property-based checks that arbitrary edit sequences keep the tree valid.
//!
//! After every operation:
//!
//! 1. The range validator and the index checks report no violation.
//! 2. Present apps can be found under their own name.
//! 3. Absent apps cannot.
//! 4. Swaps leave every leaf identifier where it was.

use proptest::prelude::*;
use strum::VariantArray;
use tiler::layout_engine::{Direction, LeafId, Node, Resolution, Tree, new_tree};

const NAMES: &[&str] = &["term", "editor", "browser", "mail", "chat", "music", ""];

#[derive(Clone, Debug)]
enum Op {
    Add(&'static str),
    Remove(&'static str, bool),
    Swap(&'static str, &'static str),
    Focus(&'static str),
    Move(Direction),
    Toggle,
    Ratio(u8),
}

fn name() -> impl Strategy<Value = &'static str> { prop::sample::select(NAMES) }

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => name().prop_map(Op::Add),
        2 => (name(), any::<bool>()).prop_map(|(name, collapse)| Op::Remove(name, collapse)),
        2 => (name(), name()).prop_map(|(a, b)| Op::Swap(a, b)),
        1 => name().prop_map(Op::Focus),
        1 => prop::sample::select(Direction::VARIANTS).prop_map(Op::Move),
        1 => Just(Op::Toggle),
        1 => any::<u8>().prop_map(Op::Ratio),
    ]
}

fn leaf_ids(tree: &Tree) -> Vec<LeafId> {
    tree.inspect(|root: &Node| root.leaves().iter().map(|leaf| leaf.id()).collect())
}

fn apply(tree: &Tree, op: &Op) {
    match *op {
        Op::Add(name) => {
            let _ = tree.add_app(name);
        }
        Op::Remove(name, collapse) => {
            tree.remove_app(name, collapse);
        }
        Op::Swap(a, b) => {
            let before = leaf_ids(tree);
            tree.swap_app(a, b);
            assert_eq!(leaf_ids(tree), before, "swap moved leaf ids");
        }
        Op::Focus(name) => {
            tree.focus_app(name);
        }
        Op::Move(direction) => {
            tree.move_focus(direction);
        }
        Op::Toggle => {
            tree.toggle_orientation();
        }
        Op::Ratio(ratio) => {
            tree.set_split_ratio(ratio);
        }
    }
}

proptest! {
    #[test]
    fn edits_preserve_invariants(ops in prop::collection::vec(op(), 0..64)) {
        let tree = new_tree(Resolution::new(1920, 1080));
        for op in &ops {
            apply(&tree, op);
            prop_assert_eq!(tree.validate(), Ok(()), "after {:?}", op);

            let apps = tree.apps();
            for name in NAMES.iter().filter(|name| !name.is_empty()) {
                let found = tree.find_app(name);
                if apps.iter().any(|app| app == name) {
                    let leaf = found.expect("present app must be found");
                    prop_assert_eq!(leaf.app_id.as_str(), *name);
                } else {
                    prop_assert!(found.is_none(), "{} found after {:?}", name, op);
                }
            }
        }
    }

    #[test]
    fn removal_without_collapse_keeps_the_shape(
        adds in prop::collection::vec(name(), 1..16),
        victim in name(),
    ) {
        let tree = new_tree(Resolution::default());
        for name in &adds {
            let _ = tree.add_app(name);
        }
        let depth = tree.inspect(Node::depth);
        let leaves = tree.inspect(|root: &Node| root.leaves().len());

        let removed = tree.remove_app(victim, false);
        prop_assert_eq!(removed.is_some(), !victim.is_empty() && adds.contains(&victim));
        prop_assert!(tree.find_app(victim).is_none());
        prop_assert_eq!(tree.inspect(Node::depth), depth);
        prop_assert_eq!(tree.inspect(|root: &Node| root.leaves().len()), leaves);
        prop_assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn ratios_stay_in_bounds(ratio in any::<u8>()) {
        let tree = new_tree(Resolution::default());
        tree.add_app("a").unwrap();
        let applied = tree.set_split_ratio(ratio).unwrap();
        prop_assert!((1..=99).contains(&applied));
        prop_assert_eq!(tree.focused_parent().unwrap().ratio, applied);
    }
}
