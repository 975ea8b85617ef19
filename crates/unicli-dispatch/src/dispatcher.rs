//! The transaction dispatcher: collect, order, check, invoke, aggregate.

use crate::{
    ApplyReport, ChangeKind, DispatchError, Registry, Transaction, WriteError,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use unicli_model::{ConfigNode, Path};
use unicli_session::CliSession;

/// Drives reconciliation transactions against one device.
///
/// The dispatcher holds only a shared reference to the frozen registry;
/// it has no state of its own, so one registry serves any number of
/// devices concurrently. All blocking happens inside the session.
///
/// Cancellation is cooperative: the token is checked between
/// registrations, never mid-command — an in-flight executor call always
/// runs to completion or timeout.
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a frozen registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Applies a transaction: resolves the changed paths to writer
    /// registrations, orders them by the declared edges, and invokes
    /// each applicable writer with the transition for its path.
    ///
    /// The first failure stops the remaining ordered batch; see
    /// [`ApplyReport`] for how partial application is reported.
    pub async fn apply(
        &self,
        session: &CliSession,
        transaction: &Transaction,
        cancel: &CancellationToken,
    ) -> ApplyReport {
        let changes = transaction.changes();
        let mut report = ApplyReport::default();
        let mut handled = vec![false; changes.len()];

        // Collect: registrations with at least one matching change.
        let mut matched: Vec<(usize, Vec<usize>)> = Vec::new();
        for reg_index in 0..self.registry.len() {
            let registration = self.registry.get(reg_index);
            let change_indices: Vec<usize> = changes
                .iter()
                .enumerate()
                .filter(|(_, c)| registration.handles(c.path()))
                .map(|(i, _)| i)
                .collect();
            if !change_indices.is_empty() {
                matched.push((reg_index, change_indices));
            }
        }

        // Order: topological sort of the matched registrations.
        let participating: Vec<usize> = matched.iter().map(|(i, _)| *i).collect();
        let ordered = self.registry.order(&participating, &[]);
        debug!(
            registrations = ordered.len(),
            changes = changes.len(),
            "apply batch ordered"
        );

        'batch: for (position, &reg_index) in ordered.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("reconciliation cancelled between registrations");
                report.cancelled = true;
                abort_rest(&ordered[position..], &matched, &handled, changes, &mut report);
                break;
            }

            let registration = self.registry.get(reg_index);
            let change_indices = &matched
                .iter()
                .find(|(i, _)| *i == reg_index)
                .expect("ordered index came from matched")
                .1;

            for (slot, &change_index) in change_indices.iter().enumerate() {
                let change = &changes[change_index];
                let path = change.path();

                if !registration.applies(path, change.before(), change.after()) {
                    debug!(path = %path, pattern = %registration.pattern(), "check declined");
                    continue;
                }
                let Some(writer) = registration.writer() else {
                    continue;
                };

                let kind = change.kind();
                debug!(path = %path, kind = kind.as_str(), "invoking writer");
                let outcome = match kind {
                    ChangeKind::Create => {
                        writer
                            .create(path, change.after().expect("create has after"), session)
                            .await
                    }
                    ChangeKind::Update => {
                        writer
                            .update(
                                path,
                                change.before().expect("update has before"),
                                change.after().expect("update has after"),
                                session,
                            )
                            .await
                    }
                    ChangeKind::Delete => {
                        writer
                            .delete(path, change.before().expect("delete has before"), session)
                            .await
                    }
                };

                match outcome {
                    Ok(()) => {
                        handled[change_index] = true;
                        report.applied.push((path.clone(), kind));
                    }
                    Err(cause) => {
                        warn!(
                            path = %path,
                            kind = kind.as_str(),
                            error = %cause,
                            "writer failed, stopping batch"
                        );
                        report.failure = Some(wrap_failure(kind, path.clone(), cause));
                        // Remaining changes of this registration, then
                        // every registration not yet attempted.
                        for &later in &change_indices[slot + 1..] {
                            push_aborted(&mut report, &handled, changes, later);
                        }
                        abort_rest(
                            &ordered[position + 1..],
                            &matched,
                            &handled,
                            changes,
                            &mut report,
                        );
                        break 'batch;
                    }
                }
            }
        }

        // Changes no registration acted on are reported, not errored.
        // The failed change itself is carried by the failure, not here.
        for (index, change) in changes.iter().enumerate() {
            let is_failure_path = report
                .failure
                .as_ref()
                .is_some_and(|f| f.path() == change.path());
            if !handled[index] && !is_failure_path && !report.aborted.contains(change.path()) {
                report.unhandled.push(change.path().clone());
            }
        }

        info!(
            applied = report.applied.len(),
            unhandled = report.unhandled.len(),
            aborted = report.aborted.len(),
            success = report.is_success(),
            "apply finished"
        );
        report
    }

    /// Reads the configuration subtree at `root`.
    ///
    /// Reader registrations at or below `root` are invoked parents
    /// first — the declared edges plus the pattern prefix relation
    /// decide the order — and each populated subtree is grafted into the
    /// result, so a child reader declared to depend on its parent can
    /// assume the parent fields were populated in the same pass.
    ///
    /// A cancellation between registrations returns the partial tree.
    pub async fn read(
        &self,
        session: &CliSession,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<ConfigNode, DispatchError> {
        let participating: Vec<usize> = (0..self.registry.len())
            .filter(|&i| {
                let registration = self.registry.get(i);
                registration.reader().is_some() && registration.pattern().matches_under(root)
            })
            .collect();

        // Depth-first: a pattern strictly under another reads after it.
        let mut prefix_edges: Vec<(usize, usize)> = Vec::new();
        for &a in &participating {
            for &b in &participating {
                let pa = self.registry.get(a).pattern();
                let pb = self.registry.get(b).pattern();
                if pb.len() > pa.len() && pb.matches_under(pa) {
                    prefix_edges.push((a, b));
                }
            }
        }
        let ordered = self.registry.order(&participating, &prefix_edges);
        debug!(root = %root, readers = ordered.len(), "read walk ordered");

        let mut tree = ConfigNode::empty();
        for &reg_index in &ordered {
            if cancel.is_cancelled() {
                info!(root = %root, "read cancelled between registrations");
                break;
            }

            let registration = self.registry.get(reg_index);
            let path = registration.pattern();
            if !registration.applies(path, None, None) {
                debug!(path = %path, "check declined read");
                continue;
            }
            let reader = registration.reader().expect("participants have readers");

            let mut builder = ConfigNode::builder();
            reader
                .read(path, session, &mut builder)
                .await
                .map_err(|source| DispatchError::ReadFailed {
                    path: path.clone(),
                    source,
                })?;
            if builder.is_empty() {
                continue;
            }
            let node = builder
                .build()
                .map_err(|e| DispatchError::ReadFailed {
                    path: path.clone(),
                    source: e.into(),
                })?;

            let rel = Path::new(path.steps()[root.len()..].to_vec());
            tree = tree.with_subtree(&rel, node);
        }
        Ok(tree)
    }
}

fn wrap_failure(kind: ChangeKind, path: Path, cause: WriteError) -> DispatchError {
    match kind {
        ChangeKind::Create => DispatchError::CreateFailed {
            path,
            source: cause,
        },
        ChangeKind::Update => DispatchError::UpdateFailed {
            path,
            source: cause,
        },
        ChangeKind::Delete => DispatchError::DeleteFailed {
            path,
            source: cause,
        },
    }
}

/// Records the paths of every not-yet-applied change of the remaining
/// registrations.
fn abort_rest(
    remaining: &[usize],
    matched: &[(usize, Vec<usize>)],
    handled: &[bool],
    changes: &[crate::Change],
    report: &mut ApplyReport,
) {
    for reg_index in remaining {
        if let Some((_, change_indices)) = matched.iter().find(|(i, _)| i == reg_index) {
            for &change_index in change_indices {
                push_aborted(report, handled, changes, change_index);
            }
        }
    }
}

fn push_aborted(
    report: &mut ApplyReport,
    handled: &[bool],
    changes: &[crate::Change],
    change_index: usize,
) {
    let path = changes[change_index].path();
    if !handled[change_index] && !report.aborted.contains(path) {
        report.aborted.push(path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Change, HandlerRegistration, RegistryBuilder, Writer};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;
    use unicli_session::{Cli, ErrorPatterns, TransportError};

    /// Transport double that accepts everything and logs commands.
    #[derive(Default)]
    struct EchoCli {
        log: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Cli for EchoCli {
        async fn execute(&self, command: &str) -> Result<String, TransportError> {
            self.log.lock().unwrap().push(command.to_string());
            Ok(String::new())
        }
    }

    /// Writer that issues one labelled command per invocation.
    struct LabelWriter {
        label: &'static str,
        fail: bool,
    }

    impl LabelWriter {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self { label, fail: false })
        }

        fn failing(label: &'static str) -> Arc<Self> {
            Arc::new(Self { label, fail: true })
        }

        async fn issue(
            &self,
            op: &str,
            path: &Path,
            session: &CliSession,
        ) -> Result<(), WriteError> {
            if self.fail {
                return Err(WriteError::other("deliberate failure"));
            }
            session
                .execute_write(&format!("{} {} {}", self.label, op, path), path)
                .await?;
            Ok(())
        }
    }

    #[async_trait]
    impl Writer for LabelWriter {
        async fn create(
            &self,
            path: &Path,
            _after: &ConfigNode,
            session: &CliSession,
        ) -> Result<(), WriteError> {
            self.issue("create", path, session).await
        }

        async fn update(
            &self,
            path: &Path,
            _before: &ConfigNode,
            _after: &ConfigNode,
            session: &CliSession,
        ) -> Result<(), WriteError> {
            self.issue("update", path, session).await
        }

        async fn delete(
            &self,
            path: &Path,
            _before: &ConfigNode,
            session: &CliSession,
        ) -> Result<(), WriteError> {
            self.issue("delete", path, session).await
        }
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn node() -> ConfigNode {
        ConfigNode::builder().field("mtu", 9100u64).build().unwrap()
    }

    fn session(cli: Arc<EchoCli>) -> CliSession {
        CliSession::new(cli, ErrorPatterns::none("test"), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_writers_run_in_dependency_order() {
        let cli = Arc::new(EchoCli::default());
        let registry = Arc::new(
            RegistryBuilder::new()
                .register(
                    HandlerRegistration::new(path("/vlans/vlan"))
                        .with_writer(LabelWriter::new("vlan"))
                        .run_after(path("/interfaces/interface")),
                )
                .register(
                    HandlerRegistration::new(path("/interfaces/interface"))
                        .with_writer(LabelWriter::new("iface")),
                )
                .build()
                .unwrap(),
        );

        let transaction = Transaction::new()
            .with_change(Change::create(path("/vlans/vlan[100]"), node()))
            .with_change(Change::create(path("/interfaces/interface[eth0]"), node()));

        let dispatcher = Dispatcher::new(registry);
        let report = dispatcher
            .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
            .await;

        assert!(report.is_success());
        let log = cli.log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "iface create /interfaces/interface[eth0]",
                "vlan create /vlans/vlan[100]",
            ]
        );
    }

    #[tokio::test]
    async fn test_declined_check_reports_unhandled() {
        let cli = Arc::new(EchoCli::default());
        let registry = Arc::new(
            RegistryBuilder::new()
                .register(
                    HandlerRegistration::new(path("/vlans/vlan"))
                        .with_writer(LabelWriter::new("vlan"))
                        .check_fn(|_, _, _| false),
                )
                .build()
                .unwrap(),
        );

        let transaction =
            Transaction::new().with_change(Change::create(path("/vlans/vlan[100]"), node()));
        let report = Dispatcher::new(registry)
            .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
            .await;

        assert!(report.is_success());
        assert!(report.applied.is_empty());
        assert_eq!(report.unhandled, vec![path("/vlans/vlan[100]")]);
        assert!(cli.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_batch_without_rollback() {
        let cli = Arc::new(EchoCli::default());
        let registry = Arc::new(
            RegistryBuilder::new()
                .register(
                    HandlerRegistration::new(path("/interfaces/interface"))
                        .with_writer(LabelWriter::new("iface")),
                )
                .register(
                    HandlerRegistration::new(path("/vlans/vlan"))
                        .with_writer(LabelWriter::failing("vlan"))
                        .run_after(path("/interfaces/interface")),
                )
                .register(
                    HandlerRegistration::new(path("/acls/acl"))
                        .with_writer(LabelWriter::new("acl"))
                        .run_after(path("/vlans/vlan")),
                )
                .build()
                .unwrap(),
        );

        let transaction = Transaction::new()
            .with_change(Change::create(path("/interfaces/interface[eth0]"), node()))
            .with_change(Change::create(path("/vlans/vlan[100]"), node()))
            .with_change(Change::create(path("/acls/acl[mgmt]"), node()));

        let report = Dispatcher::new(registry)
            .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
            .await;

        // The interface was applied and stays applied.
        assert_eq!(
            report.applied,
            vec![(path("/interfaces/interface[eth0]"), ChangeKind::Create)]
        );
        let failure = report.failure.expect("batch failed");
        assert_eq!(failure.operation(), "create");
        assert_eq!(failure.path(), &path("/vlans/vlan[100]"));
        // The dependent registration was aborted, not attempted.
        assert_eq!(report.aborted, vec![path("/acls/acl[mgmt]")]);
        assert_eq!(
            cli.log.lock().unwrap().clone(),
            vec!["iface create /interfaces/interface[eth0]"]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_registrations() {
        let cli = Arc::new(EchoCli::default());
        let registry = Arc::new(
            RegistryBuilder::new()
                .register(
                    HandlerRegistration::new(path("/interfaces/interface"))
                        .with_writer(LabelWriter::new("iface")),
                )
                .build()
                .unwrap(),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let transaction = Transaction::new()
            .with_change(Change::create(path("/interfaces/interface[eth0]"), node()));
        let report = Dispatcher::new(registry)
            .apply(&session(cli.clone()), &transaction, &cancel)
            .await;

        assert!(report.cancelled);
        assert!(!report.is_success());
        assert_eq!(report.aborted, vec![path("/interfaces/interface[eth0]")]);
        assert!(cli.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_dispatch() {
        let cli = Arc::new(EchoCli::default());
        let registry = Arc::new(
            RegistryBuilder::new()
                .register(
                    HandlerRegistration::new(path("/interfaces/interface"))
                        .with_writer(LabelWriter::new("iface")),
                )
                .build()
                .unwrap(),
        );

        let transaction = Transaction::new()
            .with_change(Change::modify(
                path("/interfaces/interface[eth0]"),
                node(),
                node(),
            ))
            .with_change(Change::remove(path("/interfaces/interface[eth1]"), node()));

        let report = Dispatcher::new(registry)
            .apply(&session(cli.clone()), &transaction, &CancellationToken::new())
            .await;

        assert!(report.is_success());
        assert_eq!(
            cli.log.lock().unwrap().clone(),
            vec![
                "iface update /interfaces/interface[eth0]",
                "iface delete /interfaces/interface[eth1]",
            ]
        );
    }
}
