//! Binary partition tree that tiles the windows of one screen/workspace.
//!
//! Leaves are window slots, branches split their space in two. Each branch
//! owns a half-open range of leaf identifiers and hands one half to each
//! child, which lets lookups route by identifier without parent links.

pub mod binary_tree;
pub mod check;
mod error;
pub(crate) mod graph;
mod id_range;
mod tree;


pub use binary_tree::{Branch, BranchView, Leaf, LeafNeighbours, LeafView, Node, Trace};
pub use check::{InvariantViolation, check};
pub use error::TreeError;
pub use graph::{Direction, Orientation, Side};
pub use id_range::{EMPTY_LEAF_ID, IdRange, LeafId};
pub use tree::{Resolution, Tree, new_tree};
