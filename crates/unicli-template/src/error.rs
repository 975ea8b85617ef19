//! Error types for template parsing and rendering.

use thiserror::Error;

/// Errors raised by the template renderer.
///
/// Both variants indicate a template-authoring bug in a vendor adapter
/// rather than absent device data, and are therefore surfaced, never
/// swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Malformed construct detected while parsing.
    #[error("template parse error at offset {position}: {message}")]
    Parse {
        /// Byte offset of the offending construct in the source.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A field reference inside `update()` did not resolve.
    #[error("unresolved field '{field}' in template fragment '{fragment}'")]
    UnresolvedField {
        /// The reference that failed to resolve.
        field: String,
        /// The surrounding template fragment.
        fragment: String,
    },
}

impl TemplateError {
    /// Creates a parse error.
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        TemplateError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Creates an unresolved-field error.
    pub(crate) fn unresolved(field: impl Into<String>, fragment: impl Into<String>) -> Self {
        TemplateError::UnresolvedField {
            field: field.into(),
            fragment: fragment.into(),
        }
    }
}
