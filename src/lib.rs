pub mod command;
pub mod common;
pub mod layout_engine;
