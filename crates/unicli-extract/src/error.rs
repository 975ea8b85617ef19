//! Error types for field extraction.

use thiserror::Error;

/// Result type alias for extraction operations.
pub type ExtractResult<T> = Result<T, ParseError>;

/// Errors raised while extracting typed values from CLI text.
///
/// Every variant carries the pattern name and, where applicable, the
/// offending line — extraction never defaults a value silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The pattern source failed to compile.
    #[error("invalid regex for pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern name.
        pattern: String,
        /// Compiler message.
        message: String,
    },

    /// A matched line lacks the requested capture group.
    #[error("pattern '{pattern}' matched '{line}' but group '{group}' is absent")]
    MissingGroup {
        /// The pattern name.
        pattern: String,
        /// The line that matched.
        line: String,
        /// The requested group name.
        group: String,
    },

    /// A captured value could not be converted to the expected type.
    #[error("pattern '{pattern}': cannot parse '{value}' as {wanted} in '{line}'")]
    InvalidValue {
        /// The pattern name.
        pattern: String,
        /// The line that matched.
        line: String,
        /// The captured text.
        value: String,
        /// The expected type name.
        wanted: &'static str,
    },
}
