//! The asynchronous CLI transport capability.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a transport implementation.
///
/// These describe the channel itself; a device rejecting a command while
/// the channel works is classified by the session, not the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The channel failed mid-exchange.
    #[error("transport channel failed: {message}")]
    Channel {
        /// Transport-specific detail.
        message: String,
    },

    /// The connection is gone.
    #[error("transport connection closed")]
    Closed,
}

impl TransportError {
    /// Creates a channel error.
    pub fn channel(message: impl Into<String>) -> Self {
        TransportError::Channel {
            message: message.into(),
        }
    }
}

/// Asynchronous CLI capability for one managed device.
///
/// The engine assumes the transport is already authenticated and sitting
/// in the correct CLI mode; session setup and teardown are the
/// integration's concern. Implementations return the full response text
/// for one command, echo and prompt handling included.
#[async_trait]
pub trait Cli: Send + Sync {
    /// Sends one command and resolves with the raw response text.
    async fn execute(&self, command: &str) -> Result<String, TransportError>;
}
