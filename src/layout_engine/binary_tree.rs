use std::mem;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::TilingSettings;
use crate::layout_engine::{
    Direction, EMPTY_LEAF_ID, IdRange, LeafId, Orientation, Resolution, Side, TreeError,
};

/// A node of the tiling tree. Branches own both children; nothing points
/// back up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf(Leaf),
    Branch(Box<Branch>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub(crate) orientation: Orientation,
    /// Percentage of the space given to the left child.
    pub(crate) ratio: u8,
    pub(crate) range: IdRange,
    pub(crate) left: Node,
    pub(crate) right: Node,
}

/// A window slot. Unoccupied when `app_id` is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Leaf {
    pub(crate) id: LeafId,
    pub(crate) app_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeafView {
    pub id: LeafId,
    pub app_id: String,
    pub is_empty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BranchView {
    pub orientation: Orientation,
    pub ratio: u8,
    pub range: IdRange,
}

/// Result of [`Tree::find_with_ancestors`](crate::layout_engine::Tree::find_with_ancestors).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trace {
    pub leaf: LeafView,
    /// Ancestors of the leaf, its parent first and the root last.
    pub ancestors: Vec<BranchView>,
    /// Sides taken from the root down to the leaf.
    pub path: Vec<Side>,
}

impl Trace {
    /// Length of the chain leaf..=root.
    pub fn depth(&self) -> usize { self.ancestors.len() + 1 }

    pub fn parent(&self) -> Option<&BranchView> { self.ancestors.first() }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeafNeighbours {
    pub up: Option<LeafView>,
    pub down: Option<LeafView>,
    pub left: Option<LeafView>,
    pub right: Option<LeafView>,
}

impl Leaf {
    pub(crate) fn empty() -> Self {
        Self {
            id: EMPTY_LEAF_ID,
            app_id: String::new(),
        }
    }

    pub fn id(&self) -> LeafId { self.id }

    pub fn app_id(&self) -> &str { &self.app_id }

    pub fn is_empty(&self) -> bool { self.app_id.is_empty() }

    pub fn view(&self) -> LeafView {
        LeafView {
            id: self.id,
            app_id: self.app_id.clone(),
            is_empty: self.is_empty(),
        }
    }

    fn vacate(&mut self) {
        self.app_id.clear();
        self.id = EMPTY_LEAF_ID;
    }
}

impl Branch {
    pub(crate) fn new(
        orientation: Orientation,
        ratio: u8,
        range: IdRange,
        left: Node,
        right: Node,
    ) -> Self {
        Self {
            orientation,
            ratio,
            range,
            left,
            right,
        }
    }

    pub fn orientation(&self) -> Orientation { self.orientation }

    pub fn ratio(&self) -> u8 { self.ratio }

    pub fn range(&self) -> IdRange { self.range }

    pub fn child(&self, side: Side) -> &Node {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Node {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn into_child(self, side: Side) -> Node {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn view(&self) -> BranchView {
        BranchView {
            orientation: self.orientation,
            ratio: self.ratio,
            range: self.range,
        }
    }
}

impl Node {
    pub(crate) fn empty_leaf() -> Self { Node::Leaf(Leaf::empty()) }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }

    pub(crate) fn node_at(&self, path: &[Side]) -> Option<&Node> {
        let mut node = self;
        for &side in path {
            node = node.as_branch()?.child(side);
        }
        Some(node)
    }

    pub(crate) fn node_at_mut(&mut self, path: &[Side]) -> Option<&mut Node> {
        let mut node = self;
        for &side in path {
            node = match node {
                Node::Branch(branch) => branch.child_mut(side),
                Node::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    pub(crate) fn leaf_at(&self, path: &[Side]) -> Option<&Leaf> { self.node_at(path)?.as_leaf() }

    pub(crate) fn leaf_at_mut(&mut self, path: &[Side]) -> Option<&mut Leaf> {
        match self.node_at_mut(path)? {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    pub(crate) fn branch_at(&self, path: &[Side]) -> Option<&Branch> {
        self.node_at(path)?.as_branch()
    }

    pub(crate) fn branch_at_mut(&mut self, path: &[Side]) -> Option<&mut Branch> {
        match self.node_at_mut(path)? {
            Node::Branch(branch) => Some(branch),
            Node::Leaf(_) => None,
        }
    }

    /// Path to the leaf reached by always taking the left child.
    pub(crate) fn first_leaf_path(&self) -> Vec<Side> {
        let mut path = Vec::new();
        let mut node = self;
        while let Node::Branch(branch) = node {
            path.push(Side::Left);
            node = &branch.left;
        }
        path
    }

    /// Descends by identifier: an occupied leaf child matches on equality,
    /// otherwise the branch child whose range holds `id` is searched.
    pub(crate) fn find_path(&self, id: LeafId) -> Option<Vec<Side>> {
        let mut path = Vec::new();
        let mut node = self;
        loop {
            let branch = match node {
                Node::Leaf(leaf) if !leaf.is_empty() && leaf.id == id => return Some(path),
                Node::Leaf(_) => return None,
                Node::Branch(branch) => branch,
            };
            let leaf_match = [Side::Left, Side::Right].into_iter().find(|&side| {
                matches!(branch.child(side), Node::Leaf(leaf) if !leaf.is_empty() && leaf.id == id)
            });
            if let Some(side) = leaf_match {
                path.push(side);
                return Some(path);
            }
            let side = [Side::Left, Side::Right].into_iter().find(|&side| {
                matches!(branch.child(side), Node::Branch(child) if child.range.contains(id))
            })?;
            path.push(side);
            node = branch.child(side);
        }
    }

    /// Depth-first, left before right, parents before children. `path` is the
    /// sequence of sides leading from `self` to the visited node.
    pub fn visit(&self, visitor: &mut impl FnMut(&Node, &[Side])) {
        fn go(node: &Node, path: &mut Vec<Side>, visitor: &mut impl FnMut(&Node, &[Side])) {
            visitor(node, path.as_slice());
            if let Node::Branch(branch) = node {
                for side in [Side::Left, Side::Right] {
                    path.push(side);
                    go(branch.child(side), path, visitor);
                    path.pop();
                }
            }
        }
        go(self, &mut Vec::new(), visitor);
    }

    /// All leaves, left to right.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Node::Leaf(leaf) => out.push(leaf),
            Node::Branch(branch) => {
                branch.left.collect_leaves(out);
                branch.right.collect_leaves(out);
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Branch(branch) => 1 + branch.left.depth().max(branch.right.depth()),
        }
    }
}

/// Tree state without any locking. Every method assumes the caller already
/// holds the guard of the owning [`Tree`](crate::layout_engine::Tree).
pub(crate) struct TreeCore {
    pub(crate) resolution: Resolution,
    pub(crate) settings: TilingSettings,
    pub(crate) root: Node,
    pub(crate) name_to_id: HashMap<String, LeafId>,
    /// Sides from the root to the last focused leaf. Everything but the last
    /// step leads to the last focused parent.
    pub(crate) focus: Vec<Side>,
}

impl TreeCore {
    pub(crate) fn new(resolution: Resolution, settings: TilingSettings) -> Self {
        let mut name_to_id = HashMap::default();
        name_to_id.insert(String::new(), EMPTY_LEAF_ID);
        Self {
            resolution,
            settings,
            root: Node::empty_leaf(),
            name_to_id,
            focus: Vec::new(),
        }
    }

    fn lookup_id(&self, name: &str) -> Option<LeafId> {
        if name.is_empty() {
            return None;
        }
        self.name_to_id.get(name).copied()
    }

    pub(crate) fn trace(&self, name: &str) -> Option<Vec<Side>> {
        let id = self.lookup_id(name)?;
        let path = self.root.find_path(id);
        if path.is_none() {
            warn!(name, id, "app is indexed but not reachable in the tree");
        }
        path
    }

    pub(crate) fn find_app(&self, name: &str) -> Option<&Leaf> {
        let path = self.trace(name)?;
        trace!(name, depth = path.len(), "found app");
        self.root.leaf_at(&path)
    }

    pub(crate) fn find_with_ancestors(&self, name: &str) -> Option<Trace> {
        let path = self.trace(name)?;
        let leaf = self.root.leaf_at(&path)?.view();
        let ancestors = (0..path.len())
            .rev()
            .filter_map(|depth| self.root.branch_at(&path[..depth]))
            .map(Branch::view)
            .collect();
        Some(Trace {
            leaf,
            ancestors,
            path,
        })
    }

    pub(crate) fn focused_leaf(&self) -> Option<&Leaf> { self.root.leaf_at(&self.focus) }

    pub(crate) fn focused_parent(&self) -> Option<&Branch> {
        let (_, parent_path) = self.focus.split_last()?;
        self.root.branch_at(parent_path)
    }

    fn focused_parent_mut(&mut self) -> Option<&mut Branch> {
        let (_, parent_path) = self.focus.split_last()?;
        self.root.branch_at_mut(parent_path)
    }

    /// Range the branch created by the next split will own.
    fn next_split_range(&self) -> Result<IdRange, TreeError> {
        match self.focus.split_last() {
            None => Ok(IdRange::FULL),
            Some((&side, parent_path)) => {
                let parent = self.root.branch_at(parent_path).ok_or(TreeError::FocusLost)?;
                Ok(parent.range.half(side))
            }
        }
    }

    /// Wraps the focused leaf into a new branch as its left child, with a
    /// fresh empty leaf on the right. Focus moves to that empty leaf.
    pub(crate) fn split_last_focused(&mut self) -> Result<(), TreeError> {
        let range = self.next_split_range()?;
        if !range.can_split() {
            warn!(%range, "refusing to split: identifier range exhausted");
            return Err(TreeError::TreeFull { range });
        }
        let ratio = self.settings.split_ratio;

        let (orientation, slot) = match self.focus.split_last() {
            None => (self.settings.initial_orientation, &mut self.root),
            Some((&side, parent_path)) => {
                let parent =
                    self.root.branch_at_mut(parent_path).ok_or(TreeError::FocusLost)?;
                (parent.orientation.flip(), parent.child_mut(side))
            }
        };
        let mut leaf = match mem::replace(slot, Node::empty_leaf()) {
            Node::Leaf(leaf) => leaf,
            branch => {
                *slot = branch;
                return Err(TreeError::FocusLost);
            }
        };
        clamp_into(&mut self.name_to_id, &mut leaf, range.lower());
        *slot = Node::Branch(Box::new(Branch::new(
            orientation,
            ratio,
            range,
            Node::Leaf(leaf),
            Node::empty_leaf(),
        )));
        self.focus.push(Side::Right);
        debug!(%range, %orientation, depth = self.focus.len(), "split focused leaf");
        Ok(())
    }

    pub(crate) fn add_app(&mut self, name: &str) -> Result<LeafView, TreeError> {
        if name.is_empty() {
            return Err(TreeError::ReservedName);
        }
        if self.name_to_id.contains_key(name) {
            warn!(name, "app is already in the tree");
            return Err(TreeError::DuplicateApp(name.to_owned()));
        }
        // The new leaf takes the top identifier of the branch the split creates.
        let range = self.next_split_range()?;
        if range.can_split() {
            let new_id = range.end - 1;
            // Only the focused leaf may hold it: the split clamps that one away.
            match self.root.find_path(new_id) {
                Some(path) if path != self.focus => {
                    warn!(name, new_id, "leaf id collision");
                    return Err(TreeError::IdCollision(new_id));
                }
                _ => {}
            }
        }

        self.split_last_focused()?;
        let new_id = self.focused_parent().ok_or(TreeError::FocusLost)?.range.end - 1;
        let leaf = self.root.leaf_at_mut(&self.focus).ok_or(TreeError::FocusLost)?;
        leaf.id = new_id;
        leaf.app_id = name.to_owned();
        let view = leaf.view();
        self.name_to_id.insert(name.to_owned(), new_id);
        debug!(name, id = new_id, "added app");
        Ok(view)
    }

    /// Vacates the app's leaf. Returns the leaf as it was before removal.
    pub(crate) fn remove_app(&mut self, name: &str, collapse_parent: bool) -> Option<LeafView> {
        let path = self.trace(name)?;
        let leaf = self.root.leaf_at_mut(&path)?;
        let removed = leaf.view();
        leaf.vacate();
        self.name_to_id.remove(name);

        if collapse_parent {
            if let Some((&side, parent_path)) = path.split_last() {
                self.collapse(parent_path, side);
            }
        }
        debug!(name, id = removed.id, collapse_parent, "removed app");
        Some(removed)
    }

    /// Replaces the branch at `parent_path` by its child opposite `removed`.
    fn collapse(&mut self, parent_path: &[Side], removed: Side) {
        let Some(slot) = self.root.node_at_mut(parent_path) else {
            return;
        };
        let branch = match mem::replace(slot, Node::empty_leaf()) {
            Node::Branch(branch) => branch,
            leaf => {
                *slot = leaf;
                return;
            }
        };
        *slot = branch.into_child(removed.other());

        let depth = parent_path.len();
        if self.focus.len() > depth && self.focus.starts_with(parent_path) {
            if self.focus[depth] == removed {
                self.focus.truncate(depth);
                let tail = self
                    .root
                    .node_at(parent_path)
                    .map(Node::first_leaf_path)
                    .unwrap_or_default();
                self.focus.extend(tail);
            } else {
                self.focus.remove(depth);
            }
        }
        trace!(depth, "collapsed parent branch");
    }

    /// Exchanges the leaves two apps occupy. Leaf ids stay where they are.
    pub(crate) fn swap_app(&mut self, a: &str, b: &str) -> bool {
        let (Some(id_a), Some(id_b)) = (self.lookup_id(a), self.lookup_id(b)) else {
            return false;
        };
        let (Some(path_a), Some(path_b)) = (self.root.find_path(id_a), self.root.find_path(id_b))
        else {
            return false;
        };
        for (path, name) in [(&path_a, b), (&path_b, a)] {
            if let Some(leaf) = self.root.leaf_at_mut(path) {
                leaf.app_id = name.to_owned();
            }
        }
        self.name_to_id.insert(a.to_owned(), id_b);
        self.name_to_id.insert(b.to_owned(), id_a);
        debug!(a, b, "swapped apps");
        true
    }

    pub(crate) fn focus_app(&mut self, name: &str) -> Option<LeafView> {
        let path = self.trace(name)?;
        let view = self.root.leaf_at(&path)?.view();
        self.focus = path;
        Some(view)
    }

    /// Closest leaf next to the leaf at `path`, found by climbing to the
    /// nearest ancestor split along the direction's axis and descending into
    /// its other side.
    fn neighbour_path(&self, path: &[Side], direction: Direction) -> Option<Vec<Side>> {
        let axis = direction.orientation();
        let towards = direction.side();
        for depth in (0..path.len()).rev() {
            let branch = self.root.branch_at(&path[..depth])?;
            if branch.orientation != axis || path[depth] == towards {
                continue;
            }
            let mut target = path[..depth].to_vec();
            target.push(towards);
            let mut node = branch.child(towards);
            while let Node::Branch(branch) = node {
                let next = if branch.orientation == axis { towards.other() } else { Side::Left };
                target.push(next);
                node = branch.child(next);
            }
            return Some(target);
        }
        None
    }

    pub(crate) fn neighbours(&self, name: &str) -> Option<LeafNeighbours> {
        let path = self.trace(name)?;
        let at = |direction| {
            let target = self.neighbour_path(&path, direction)?;
            self.root.leaf_at(&target).map(Leaf::view)
        };
        Some(LeafNeighbours {
            up: at(Direction::Up),
            down: at(Direction::Down),
            left: at(Direction::Left),
            right: at(Direction::Right),
        })
    }

    pub(crate) fn move_focus(&mut self, direction: Direction) -> Option<LeafView> {
        let target = self.neighbour_path(&self.focus, direction)?;
        let view = self.root.leaf_at(&target)?.view();
        self.focus = target;
        Some(view)
    }

    pub(crate) fn toggle_orientation(&mut self) -> Option<Orientation> {
        let parent = self.focused_parent_mut()?;
        parent.orientation = parent.orientation.flip();
        Some(parent.orientation)
    }

    pub(crate) fn set_split_ratio(&mut self, ratio: u8) -> Option<u8> {
        let parent = self.focused_parent_mut()?;
        parent.ratio = ratio.clamp(1, 99);
        Some(parent.ratio)
    }

    pub(crate) fn apps(&self) -> Vec<String> {
        let mut apps: Vec<_> =
            self.name_to_id.keys().filter(|name| !name.is_empty()).cloned().collect();
        apps.sort();
        apps
    }

    pub(crate) fn draw_tree(&self) -> String {
        fn build(node: &Node, path: &mut Vec<Side>, focus: &[Side]) -> ascii_tree::Tree {
            match node {
                Node::Leaf(leaf) => {
                    let marker = if path.as_slice() == focus { "☒ " } else { "☐ " };
                    let app = if leaf.is_empty() { "<empty>" } else { leaf.app_id.as_str() };
                    ascii_tree::Tree::Leaf(vec![format!("{marker}#{} {app}", leaf.id)])
                }
                Node::Branch(branch) => {
                    let desc = format!(
                        "{} {}% {}",
                        branch.orientation, branch.ratio, branch.range
                    );
                    let children = [Side::Left, Side::Right]
                        .into_iter()
                        .map(|side| {
                            path.push(side);
                            let child = build(branch.child(side), path, focus);
                            path.pop();
                            child
                        })
                        .collect();
                    ascii_tree::Tree::Node(desc, children)
                }
            }
        }

        let tree = build(&self.root, &mut Vec::new(), &self.focus);
        let mut out = String::new();
        if let Err(err) = ascii_tree::write_tree(&mut out, &tree) {
            warn!(%err, "failed to render tree");
        }
        out
    }
}

/// Moves the leaf's identifier into `range`, keeping the index in step for
/// occupied leaves.
fn clamp_into(index: &mut HashMap<String, LeafId>, leaf: &mut Leaf, range: IdRange) {
    let Some(clamped) = range.clamp(leaf.id) else {
        return;
    };
    if clamped == leaf.id {
        return;
    }
    trace!(app = %leaf.app_id, from = leaf.id, to = clamped, "clamping leaf id");
    leaf.id = clamped;
    if !leaf.is_empty() {
        index.insert(leaf.app_id.clone(), clamped);
    }
}
