//! Rendered CLI commands and per-transaction batching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single rendered CLI command.
///
/// The text is opaque to the engine. The ordering hint lets a writer
/// interleave context-entry and context-exit lines deterministically;
/// commands with equal hints keep their append order. A noop command is a
/// placeholder that participates in ordering but is never issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    text: String,
    order: i32,
    noop: bool,
}

impl Command {
    /// Creates a command with the default ordering hint (0).
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            order: 0,
            noop: false,
        }
    }

    /// Creates a noop placeholder with the given ordering hint.
    pub fn noop(order: i32) -> Self {
        Self {
            text: String::new(),
            order,
            noop: true,
        }
    }

    /// Sets the ordering hint.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Returns the command text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the ordering hint.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns true if this is a noop placeholder.
    pub fn is_noop(&self) -> bool {
        self.noop
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Append-only collector for the commands of one reconciliation unit.
///
/// Commands are never mutated after creation; the batch only grows.
/// [`CommandBatch::into_lines`] yields the issue order: a stable sort by
/// ordering hint, preserving append order within equal hints, with noop
/// placeholders dropped.
#[derive(Debug, Default)]
pub struct CommandBatch {
    commands: Vec<Command>,
}

impl CommandBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Appends one command line per non-blank line of rendered template
    /// output, all with the given ordering hint.
    pub fn push_rendered(&mut self, rendered: &str, order: i32) {
        for line in rendered.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            self.commands.push(Command::new(line).with_order(order));
        }
    }

    /// Returns the number of collected commands (noops included).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if no commands were collected.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the collected commands in append order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consumes the batch and returns issue-ordered command text.
    pub fn into_lines(self) -> Vec<String> {
        let mut commands = self.commands;
        commands.sort_by_key(Command::order);
        commands
            .into_iter()
            .filter(|c| !c.is_noop())
            .map(|c| c.text)
            .collect()
    }
}
