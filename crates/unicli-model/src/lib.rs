//! Configuration data model for the unicli reconciliation engine.
//!
//! This crate provides the vendor-neutral value types shared by every
//! other engine crate:
//!
//! - [`Path`]: a location in the hierarchical configuration tree
//! - [`Value`]: a scalar leaf value
//! - [`ConfigNode`]: an immutable subtree snapshot with a staged builder
//! - [`Command`] / [`CommandBatch`]: rendered CLI commands collected per
//!   reconciliation transaction
//!
//! # Lifecycle
//!
//! `Path` values and anything derived from them are built once at process
//! start and shared read-only. `ConfigNode` and `Command` instances are
//! created per transaction and discarded when it completes; they are never
//! shared across transactions.

mod command;
mod node;
mod path;

pub use command::{Command, CommandBatch};
pub use node::{ConfigNode, ConfigNodeBuilder, Value};
pub use path::{Path, PathStep};

/// Common error type for model construction failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid path syntax: {0}")]
    InvalidPath(String),

    #[error("duplicate field '{0}' on node")]
    DuplicateField(String),

    #[error("duplicate child '{0}' on node")]
    DuplicateChild(String),
}
