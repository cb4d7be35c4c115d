use thiserror::Error;

use crate::layout_engine::{IdRange, LeafId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("app {0:?} is already in the tree")]
    DuplicateApp(String),
    #[error("the empty app name is reserved for unoccupied leaves")]
    ReservedName,
    #[error("tree full on this branch: {range} cannot be split any further")]
    TreeFull { range: IdRange },
    #[error("leaf id {0} is already taken by another app")]
    IdCollision(LeafId),
    #[error("focus cursor does not point at a leaf")]
    FocusLost,
}
