//! Scripted CLI transport double.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;
use unicli_session::{Cli, TransportError};

/// A transport that answers from a script and records every command.
///
/// Unknown commands get the default response (empty text, the shape of
/// a silently accepted configuration line). A command registered with
/// [`MockCli::hang_on`] never completes, for exercising timeouts.
///
/// # Example
///
/// ```
/// use unicli_test::MockCli;
///
/// let cli = MockCli::new().respond("show vlan", "vlan 12\nvlan 14");
/// assert!(cli.commands().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockCli {
    responses: Mutex<Vec<(String, String)>>,
    hangs: Mutex<HashSet<String>>,
    log: Mutex<Vec<String>>,
}

impl MockCli {
    /// Creates a transport that accepts everything silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for one exact command.
    pub fn respond(self, command: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((command.into(), response.into()));
        self
    }

    /// Makes one exact command hang forever.
    pub fn hang_on(self, command: impl Into<String>) -> Self {
        self.hangs.lock().unwrap().insert(command.into());
        self
    }

    /// Returns every command issued so far, in issue order.
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Clears the command log.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl Cli for MockCli {
    async fn execute(&self, command: &str) -> Result<String, TransportError> {
        self.log.lock().unwrap().push(command.to_string());
        if self.hangs.lock().unwrap().contains(command) {
            info!(command = %command, "mock transport hanging");
            std::future::pending::<()>().await;
        }
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .iter()
            .find(|(c, _)| c == command)
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }
}
