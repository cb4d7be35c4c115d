use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::TilingSettings;
use crate::layout_engine::binary_tree::{
    BranchView, LeafNeighbours, LeafView, Node, Trace, TreeCore,
};
use crate::layout_engine::check::InvariantViolation;
use crate::layout_engine::{Direction, Orientation, TreeError};

/// Pixel size of the screen a tree lays out. Only carried along for the
/// geometry projection; the tree itself never looks at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }
}

/// The tiling tree of one screen/workspace.
///
/// Every method takes the internal lock exactly once and then works on the
/// unlocked core, so no entry point ever calls another one while holding it.
pub struct Tree {
    core: Mutex<TreeCore>,
}

impl Tree {
    pub fn new(resolution: Resolution) -> Self {
        Self::with_settings(resolution, TilingSettings::default())
    }

    pub fn with_settings(resolution: Resolution, settings: TilingSettings) -> Self {
        debug!(?resolution, ?settings, "creating tiling tree");
        Self {
            core: Mutex::new(TreeCore::new(resolution, settings)),
        }
    }

    pub fn resolution(&self) -> Resolution { self.core.lock().resolution }

    /// Looks an app up by name. The empty name never matches.
    pub fn find_app(&self, name: &str) -> Option<LeafView> {
        self.core.lock().find_app(name).map(|leaf| leaf.view())
    }

    pub fn find_with_ancestors(&self, name: &str) -> Option<Trace> {
        self.core.lock().find_with_ancestors(name)
    }

    /// Splits the focused leaf and places `name` in the new right half.
    pub fn add_app(&self, name: &str) -> Result<LeafView, TreeError> {
        self.core.lock().add_app(name)
    }

    /// Vacates the app's leaf and, with `collapse_parent`, replaces its parent
    /// branch by the sibling. Unknown names are ignored.
    pub fn remove_app(&self, name: &str, collapse_parent: bool) -> Option<LeafView> {
        self.core.lock().remove_app(name, collapse_parent)
    }

    /// Makes two apps trade places. Does nothing unless both are present.
    pub fn swap_app(&self, a: &str, b: &str) -> bool { self.core.lock().swap_app(a, b) }

    pub fn focus_app(&self, name: &str) -> Option<LeafView> { self.core.lock().focus_app(name) }

    pub fn focused(&self) -> Option<LeafView> {
        self.core.lock().focused_leaf().map(|leaf| leaf.view())
    }

    pub fn focused_parent(&self) -> Option<BranchView> {
        self.core.lock().focused_parent().map(|branch| branch.view())
    }

    pub fn neighbours(&self, name: &str) -> Option<LeafNeighbours> {
        self.core.lock().neighbours(name)
    }

    pub fn move_focus(&self, direction: Direction) -> Option<LeafView> {
        self.core.lock().move_focus(direction)
    }

    pub fn toggle_orientation(&self) -> Option<Orientation> {
        self.core.lock().toggle_orientation()
    }

    pub fn set_split_ratio(&self, ratio: u8) -> Option<u8> {
        self.core.lock().set_split_ratio(ratio)
    }

    pub fn apps(&self) -> Vec<String> { self.core.lock().apps() }

    /// Runs `f` on the root while holding the lock. Geometry projection walks
    /// the tree through here.
    pub fn inspect<R>(&self, f: impl FnOnce(&Node) -> R) -> R { f(&self.core.lock().root) }

    pub fn draw_tree(&self) -> String { self.core.lock().draw_tree() }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.core.lock().root)
    }

    pub fn validate(&self) -> Result<(), InvariantViolation> { self.core.lock().validate() }
}

pub fn new_tree(resolution: Resolution) -> Tree { Tree::new(resolution) }
