//! Error types for registration and dispatch.

use thiserror::Error;
use unicli_extract::ParseError;
use unicli_model::{ModelError, Path};
use unicli_session::SessionError;
use unicli_template::TemplateError;

/// Errors detected while building a [`crate::Registry`].
///
/// These are configuration errors in the vendor layer and fail fast at
/// process start, never per-transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The declared ordering edges contain a cycle.
    #[error("dependency cycle among handler registrations: {cycle}")]
    DependencyCycle {
        /// The registrations still locked in the cycle.
        cycle: String,
    },

    /// An ordering edge references a path no registration carries.
    #[error("registration '{registration}' orders against unknown path '{reference}'")]
    UnknownReference {
        /// The registration declaring the edge.
        registration: String,
        /// The referenced path.
        reference: String,
    },
}

/// Failure cause returned by a [`crate::Reader`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// Command execution failed.
    #[error("command execution failed: {0}")]
    Session(#[from] SessionError),

    /// Response text could not be parsed.
    #[error("output parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// The populated builder was structurally invalid.
    #[error("invalid node under construction: {0}")]
    Model(#[from] ModelError),

    /// Adapter-specific failure.
    #[error("reader failed: {message}")]
    Other {
        /// What went wrong.
        message: String,
    },
}

impl ReadError {
    /// Creates an adapter-specific failure.
    pub fn other(message: impl Into<String>) -> Self {
        ReadError::Other {
            message: message.into(),
        }
    }
}

/// Failure cause returned by a [`crate::Writer`].
#[derive(Debug, Error)]
pub enum WriteError {
    /// Command execution failed.
    #[error("command execution failed: {0}")]
    Session(#[from] SessionError),

    /// Command rendering failed.
    #[error("command rendering failed: {0}")]
    Template(#[from] TemplateError),

    /// A model value was structurally invalid.
    #[error("invalid model value: {0}")]
    Model(#[from] ModelError),

    /// Adapter-specific failure.
    #[error("writer failed: {message}")]
    Other {
        /// What went wrong.
        message: String,
    },
}

impl WriteError {
    /// Creates an adapter-specific failure.
    pub fn other(message: impl Into<String>) -> Self {
        WriteError::Other {
            message: message.into(),
        }
    }

    /// Returns true if the caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteError::Session(e) if e.is_retryable())
    }
}

/// A failure surfaced by the [`crate::Dispatcher`], carrying the path
/// and operation kind it occurred at.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A create invocation failed.
    #[error("create failed at {path}: {source}")]
    CreateFailed {
        /// The subtree being created.
        path: Path,
        /// The underlying cause.
        #[source]
        source: WriteError,
    },

    /// An update invocation failed.
    #[error("update failed at {path}: {source}")]
    UpdateFailed {
        /// The subtree being updated.
        path: Path,
        /// The underlying cause.
        #[source]
        source: WriteError,
    },

    /// A delete invocation failed.
    #[error("delete failed at {path}: {source}")]
    DeleteFailed {
        /// The subtree being deleted.
        path: Path,
        /// The underlying cause.
        #[source]
        source: WriteError,
    },

    /// A read invocation failed.
    #[error("read failed at {path}: {source}")]
    ReadFailed {
        /// The subtree being read.
        path: Path,
        /// The underlying cause.
        #[source]
        source: ReadError,
    },
}

impl DispatchError {
    /// Returns the path the failure occurred at.
    pub fn path(&self) -> &Path {
        match self {
            DispatchError::CreateFailed { path, .. }
            | DispatchError::UpdateFailed { path, .. }
            | DispatchError::DeleteFailed { path, .. }
            | DispatchError::ReadFailed { path, .. } => path,
        }
    }

    /// Returns the operation kind as a string, for logs and reports.
    pub fn operation(&self) -> &'static str {
        match self {
            DispatchError::CreateFailed { .. } => "create",
            DispatchError::UpdateFailed { .. } => "update",
            DispatchError::DeleteFailed { .. } => "delete",
            DispatchError::ReadFailed { .. } => "read",
        }
    }
}
