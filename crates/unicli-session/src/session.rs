//! Blocking command execution over a serialized CLI session.

use crate::{Cli, ErrorPatterns, SessionError, SessionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use unicli_model::Path;

/// One logical CLI session for one managed device.
///
/// All commands issued through a session are strictly sequential: the
/// session never overlaps two in-flight commands on the same transport.
/// Each round-trip blocks the invoking logical unit of work until the
/// transport responds or the deadline elapses; the suspension holds no
/// lock beyond the session's own issue lock.
///
/// Execution is single-shot. A [`SessionError::TransportTimeout`] or
/// [`SessionError::DeviceRejected`] is surfaced to the caller, which may
/// retry at a higher level; the session itself never re-issues a
/// command, and an in-flight call always runs to completion or timeout.
pub struct CliSession {
    transport: Arc<dyn Cli>,
    patterns: ErrorPatterns,
    deadline: Duration,
    issue_lock: Mutex<()>,
}

impl CliSession {
    /// Creates a session over an authenticated transport.
    pub fn new(transport: Arc<dyn Cli>, patterns: ErrorPatterns, deadline: Duration) -> Self {
        Self {
            transport,
            patterns,
            deadline,
            issue_lock: Mutex::new(()),
        }
    }

    /// Returns the device family this session is classified against.
    pub fn family(&self) -> &str {
        self.patterns.family()
    }

    /// Issues a `show`-style command and returns the response text.
    pub async fn execute_read(&self, command: &str, path: &Path) -> SessionResult<String> {
        self.issue(command, path).await
    }

    /// Issues a configuration command, reading and classifying the
    /// response to confirm acceptance.
    pub async fn execute_write(&self, command: &str, path: &Path) -> SessionResult<()> {
        self.issue(command, path).await.map(|_| ())
    }

    async fn issue(&self, command: &str, path: &Path) -> SessionResult<String> {
        let _serialized = self.issue_lock.lock().await;

        debug!(command = %command, path = %path, family = %self.family(), "issuing command");
        let outcome = tokio::time::timeout(self.deadline, self.transport.execute(command)).await;

        match outcome {
            Err(_) => {
                warn!(command = %command, path = %path, "command timed out");
                Err(SessionError::TransportTimeout {
                    command: command.to_string(),
                    deadline_ms: self.deadline.as_millis() as u64,
                })
            }
            Ok(Err(source)) => {
                warn!(command = %command, path = %path, error = %source, "transport failed");
                Err(SessionError::Transport {
                    command: command.to_string(),
                    source,
                })
            }
            Ok(Ok(response)) => {
                if let Some(pattern) = self.patterns.matched(&response) {
                    warn!(
                        command = %command,
                        path = %path,
                        pattern = %pattern,
                        "device rejected command"
                    );
                    return Err(SessionError::DeviceRejected {
                        command: command.to_string(),
                        response,
                    });
                }
                trace!(command = %command, path = %path, "command accepted");
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportError;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Transport double: scripted responses plus an issue log.
    struct ScriptedCli {
        responses: StdMutex<Vec<(String, String)>>,
        log: StdMutex<Vec<String>>,
        hang: bool,
    }

    impl ScriptedCli {
        fn new() -> Self {
            Self {
                responses: StdMutex::new(Vec::new()),
                log: StdMutex::new(Vec::new()),
                hang: false,
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::new()
            }
        }

        fn respond(self, command: &str, response: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push((command.to_string(), response.to_string()));
            self
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Cli for ScriptedCli {
        async fn execute(&self, command: &str) -> Result<String, TransportError> {
            self.log.lock().unwrap().push(command.to_string());
            if self.hang {
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

    fn path() -> Path {
        "/interfaces/interface[eth0]".parse().unwrap()
    }

    #[tokio::test]
    async fn test_read_returns_response() {
        let cli = Arc::new(ScriptedCli::new().respond("show vlan", "vlan 12\nvlan 14"));
        let session = CliSession::new(
            cli.clone(),
            ErrorPatterns::none("test"),
            Duration::from_secs(1),
        );

        let out = session.execute_read("show vlan", &path()).await.unwrap();
        assert_eq!(out, "vlan 12\nvlan 14");
        assert_eq!(cli.log(), vec!["show vlan"]);
    }

    #[tokio::test]
    async fn test_write_confirms_acceptance() {
        let cli = Arc::new(ScriptedCli::new().respond("mtu 9100", ""));
        let session = CliSession::new(
            cli.clone(),
            ErrorPatterns::new("ios", &["(?m)^% "]).unwrap(),
            Duration::from_secs(1),
        );

        session.execute_write("mtu 9100", &path()).await.unwrap();
        assert_eq!(cli.log(), vec!["mtu 9100"]);
    }

    #[tokio::test]
    async fn test_rejection_despite_transport_success() {
        let cli = Arc::new(
            ScriptedCli::new().respond("mtu 99999", "% Invalid input detected at '^' marker."),
        );
        let session = CliSession::new(
            cli,
            ErrorPatterns::new("ios", &["(?m)^% Invalid input"]).unwrap(),
            Duration::from_secs(1),
        );

        let err = session.execute_write("mtu 99999", &path()).await.unwrap_err();
        match err {
            SessionError::DeviceRejected { command, response } => {
                assert_eq!(command, "mtu 99999");
                assert!(response.contains("Invalid input"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_distinct_from_rejection() {
        let cli = Arc::new(ScriptedCli::hanging());
        let session = CliSession::new(
            cli,
            ErrorPatterns::none("test"),
            Duration::from_millis(100),
        );

        let err = session.execute_read("show tech", &path()).await.unwrap_err();
        assert!(err.is_retryable());
        match err {
            SessionError::TransportTimeout {
                command,
                deadline_ms,
            } => {
                assert_eq!(command, "show tech");
                assert_eq!(deadline_ms, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_commands_are_serialized() {
        let cli = Arc::new(ScriptedCli::new());
        let session = Arc::new(CliSession::new(
            cli.clone(),
            ErrorPatterns::none("test"),
            Duration::from_secs(1),
        ));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let session = session.clone();
            tasks.push(tokio::spawn(async move {
                session
                    .execute_write(&format!("cmd {i}"), &Path::root())
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // All eight issued, one at a time; the log holds each exactly once.
        let mut log = cli.log();
        assert_eq!(log.len(), 8);
        log.sort();
        log.dedup();
        assert_eq!(log.len(), 8);
    }
}
