//! Line-oriented commands for driving a [`Tree`] from a terminal or a script.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, trace};

use crate::common::config::TilingSettings;
use crate::layout_engine::{Direction, LeafView, Tree};

#[derive(Parser, Debug, PartialEq)]
#[command(multicall = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Split the focused leaf and place an app in the new half
    Add { name: String },
    /// Remove an app, collapsing its parent unless told otherwise
    Remove {
        name: String,
        /// Replace the parent branch with the remaining sibling
        #[arg(long, conflicts_with = "keep")]
        collapse: bool,
        /// Only vacate the leaf
        #[arg(long)]
        keep: bool,
    },
    /// Make two apps trade places
    Swap { a: String, b: String },
    /// Show the leaf an app occupies
    Find { name: String },
    /// Move the focus cursor onto an app
    Focus { name: String },
    /// Move the focus cursor to the neighbouring leaf
    Move { direction: DirectionArg },
    /// Flip the split axis of the focused leaf's parent
    Toggle,
    /// Set the split ratio of the focused leaf's parent
    Ratio { percent: u8 },
    /// List the apps in the tree
    Apps,
    /// Print the tree
    Tree,
    /// Print the tree as JSON
    Dump,
    /// Validate the tree invariants
    Check,
    /// Stop reading commands
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionArg {
    Left,
    Right,
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Left => Direction::Left,
            DirectionArg::Right => Direction::Right,
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit(String),
}

pub struct Session {
    tree: Tree,
    collapse_on_remove: bool,
}

impl Session {
    pub fn new(tree: Tree, settings: &TilingSettings) -> Self {
        Self {
            tree,
            collapse_on_remove: settings.collapse_on_remove,
        }
    }

    pub fn tree(&self) -> &Tree { &self.tree }

    /// Parses and runs one input line. Blank lines produce no outcome; parse
    /// and execution errors are turned into replies.
    pub fn handle_line(&self, line: &str) -> Option<Outcome> {
        let words = split_command_line(line);
        if words.is_empty() {
            return None;
        }
        trace!(?words, "parsed command line");
        let outcome = match CommandLine::try_parse_from(&words) {
            Ok(parsed) => match self.execute(parsed.command) {
                Ok(outcome) => outcome,
                Err(err) => Outcome::Reply(format!("error: {err:#}")),
            },
            Err(err) => Outcome::Reply(err.to_string().trim_end().to_owned()),
        };
        Some(outcome)
    }

    pub fn execute(&self, command: Command) -> anyhow::Result<Outcome> {
        debug!(?command, "executing");
        let reply = match command {
            Command::Add { name } => {
                let leaf = self.tree.add_app(&name)?;
                format!("added {}", describe(&leaf))
            }
            Command::Remove { name, collapse, keep } => {
                let collapse = collapse || (self.collapse_on_remove && !keep);
                match self.tree.remove_app(&name, collapse) {
                    Some(leaf) => format!("removed {}", describe(&leaf)),
                    None => format!("{name} not found"),
                }
            }
            Command::Swap { a, b } => {
                if self.tree.swap_app(&a, &b) {
                    format!("swapped {a} and {b}")
                } else {
                    format!("cannot swap {a} and {b}: not both present")
                }
            }
            Command::Find { name } => match self.tree.find_with_ancestors(&name) {
                Some(trace) => format!("{} at depth {}", describe(&trace.leaf), trace.depth()),
                None => format!("{name} not found"),
            },
            Command::Focus { name } => match self.tree.focus_app(&name) {
                Some(leaf) => format!("focused {}", describe(&leaf)),
                None => format!("{name} not found"),
            },
            Command::Move { direction } => {
                let direction = Direction::from(direction);
                match self.tree.move_focus(direction) {
                    Some(leaf) => format!("focused {}", describe(&leaf)),
                    None => format!("no leaf {direction} of the focus"),
                }
            }
            Command::Toggle => match self.tree.toggle_orientation() {
                Some(orientation) => format!("split is now {orientation}"),
                None => "nothing to toggle".to_owned(),
            },
            Command::Ratio { percent } => match self.tree.set_split_ratio(percent) {
                Some(ratio) => format!("ratio is now {ratio}%"),
                None => "nothing to resize".to_owned(),
            },
            Command::Apps => {
                let apps = self.tree.apps();
                if apps.is_empty() { "<none>".to_owned() } else { apps.join(" ") }
            }
            Command::Tree => self.tree.draw_tree().trim_end().to_owned(),
            Command::Dump => self.tree.to_json()?,
            Command::Check => match self.tree.validate() {
                Ok(()) => "ok".to_owned(),
                Err(violation) => format!("violation: {violation}"),
            },
            Command::Quit => return Ok(Outcome::Quit("bye".to_owned())),
        };
        Ok(Outcome::Reply(reply))
    }
}

fn describe(leaf: &LeafView) -> String {
    if leaf.is_empty {
        format!("<empty> #{}", leaf.id)
    } else {
        format!("{} #{}", leaf.app_id, leaf.id)
    }
}

/// Splits on whitespace, keeping quoted runs together so app names may
/// contain spaces.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' if quote.is_none() => {
                quote = Some(ch);
                quoted = true;
            }
            c if Some(c) == quote => quote = None,
            '\\' if quote.is_some() => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            c if c.is_whitespace() && quote.is_none() => {
                if !current.is_empty() || quoted {
                    parts.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() || quoted {
        parts.push(current);
    }

    parts
}
