//! Error types for command execution.

use crate::TransportError;
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while executing a command through a [`crate::CliSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport did not respond within the deadline.
    #[error("command '{command}' timed out after {deadline_ms} ms")]
    TransportTimeout {
        /// The command that was in flight.
        command: String,
        /// The deadline that elapsed.
        deadline_ms: u64,
    },

    /// The channel succeeded but the response matched a configured
    /// error pattern for the device family.
    #[error("device rejected command '{command}': {response}")]
    DeviceRejected {
        /// The rejected command.
        command: String,
        /// The full response text.
        response: String,
    },

    /// The transport itself failed.
    #[error("transport failed for command '{command}': {source}")]
    Transport {
        /// The command that was in flight.
        command: String,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },

    /// A device profile could not be loaded or compiled.
    #[error("invalid device profile for family '{family}': {message}")]
    InvalidProfile {
        /// The device family.
        family: String,
        /// What went wrong.
        message: String,
    },
}

impl SessionError {
    /// Returns true if the caller may reasonably retry the operation.
    ///
    /// Only timeouts qualify: a rejection is the device's verdict on the
    /// command text, and a transport failure needs the channel rebuilt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::TransportTimeout { .. })
    }
}
